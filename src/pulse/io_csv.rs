// Primitives for reading CSV files.

use std::fs::File;

use csv::StringRecord;

use crate::pulse::{
    io_common::{parse_score, parse_timestamp, simplify_file_name},
    *,
};

// Positions of the columns, found from the header row.
struct Columns {
    id: Option<usize>,
    campaign_id: usize,
    campaign_name: usize,
    unit_id: Option<usize>,
    unit_name: Option<usize>,
    score: Option<usize>,
    submitted_at: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> PulseResult<Columns> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let required = |name: &str| find(name).context(CsvMissingColumnSnafu { column: name });
        Ok(Columns {
            id: find("id"),
            campaign_id: required("campaignId")?,
            campaign_name: required("campaignName")?,
            unit_id: find("unitId"),
            unit_name: find("unitName"),
            score: find("score"),
            submitted_at: required("submittedAt")?,
        })
    }
}

pub fn read_csv_responses(path: &str) -> PulseResult<Vec<ResponseRecord>> {
    let default_id = make_default_id(path);

    let (mut rdr, header) = get_records(path)?;
    let columns = Columns::from_header(&header)?;

    let mut res: Vec<ResponseRecord> = Vec::new();
    let mut skipped: usize = 0;
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("{:?} {:?}", lineno, line);

        let id = match optional(&line, columns.id) {
            Some(id) => id,
            None => default_id(lineno),
        };
        let score = optional(&line, columns.score).and_then(|s| parse_score(&id, &s));
        let submitted_at = match parse_timestamp(&required(&line, columns.submitted_at, lineno)?) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Line {} (response {}): skipped: {}", lineno, id, e);
                skipped += 1;
                continue;
            }
        };

        res.push(ResponseRecord {
            campaign_id: required(&line, columns.campaign_id, lineno)?,
            campaign_name: required(&line, columns.campaign_name, lineno)?,
            unit_id: optional(&line, columns.unit_id),
            unit_name: optional(&line, columns.unit_name),
            score,
            submitted_at,
            id,
        });
    }
    info!(
        "read_csv_responses: {} responses in {:?}, {} skipped",
        res.len(),
        path,
        skipped
    );
    Ok(res)
}

fn required(line: &StringRecord, idx: usize, lineno: usize) -> PulseResult<String> {
    let s = line.get(idx).context(CsvLineTooShortSnafu { lineno })?;
    Ok(s.trim().to_string())
}

// Empty cells and short lines are both read as missing values.
fn optional(line: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| line.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn get_records(path: &str) -> PulseResult<(csv::Reader<File>, StringRecord)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1usize })?
        .clone();
    Ok((rdr, header))
}

fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
