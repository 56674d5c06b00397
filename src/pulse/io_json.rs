// Reader for stored responses exported as JSON.

use snafu::OptionExt;

use crate::pulse::*;

pub fn read_json_responses(path: &str) -> PulseResult<Vec<ResponseRecord>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;

    let document: ResponsesDocument =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;

    // A missing collection is a broken export, not an empty one.
    let stored = document
        .responses
        .context(MissingResponsesSnafu { path })?;

    let mut res: Vec<ResponseRecord> = Vec::new();
    let mut skipped: usize = 0;
    for s in stored.iter() {
        // A record that cannot be placed in time is left out, the others are kept.
        match s.to_record() {
            Ok(r) => res.push(r),
            Err(e) => {
                warn!("Response {}: skipped: {}", s.id, e);
                skipped += 1;
            }
        }
    }
    info!(
        "read_json_responses: {} responses in {:?}, {} skipped",
        res.len(),
        path,
        skipped
    );
    Ok(res)
}
