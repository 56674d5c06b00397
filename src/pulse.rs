use log::{debug, info, warn};

use snafu::{prelude::*, ErrorCompat, Snafu};
use survey_engine::*;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::pulse::config_reader::*;

pub mod config_reader;
pub mod interactive;
pub mod io_common;
pub mod io_csv;
pub mod io_json;

#[derive(Debug, Snafu)]
pub enum PulseError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing to JSON"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput { source: std::io::Error, path: String },
    #[snafu(display("Error on the terminal"))]
    Console { source: std::io::Error },
    #[snafu(display("The document {path} does not contain a responses array"))]
    MissingResponses { path: String },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("The CSV header has no {column} column"))]
    CsvMissingColumn { column: String },
    #[snafu(display("Could not read timestamp {value:?}"))]
    ParsingTimestamp {
        source: chrono::ParseError,
        value: String,
    },

    #[snafu(display("Response provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Question {question_id} has an unknown type {question_type:?}"))]
    UnknownQuestionType {
        question_id: String,
        question_type: String,
    },
    #[snafu(display("Invalid survey definition: {source}"))]
    InvalidSurvey { source: DefinitionError },
    #[snafu(display("Survey {slug} is not active"))]
    InactiveSurvey { slug: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PulseResult<T> = Result<T, PulseError>;

/// Command line values that take precedence over the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ReportOverrides {
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub out: Option<String>,
    pub recent_limit: Option<usize>,
    pub utc_offset_minutes: Option<i32>,
}

fn summary_fields(s: &Summary) -> JSMap<String, JSValue> {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("total".to_string(), json!(s.total));
    m.insert("withScore".to_string(), json!(s.with_score));
    m.insert("promoters".to_string(), json!(s.promoters));
    m.insert("passives".to_string(), json!(s.passives));
    m.insert("detractors".to_string(), json!(s.detractors));
    // Absent metrics are written as null, never as zero.
    m.insert("meanScore".to_string(), json!(s.mean_score));
    m.insert(
        "netScorePercentage".to_string(),
        json!(s.net_score_percentage),
    );
    m
}

fn groups_to_json(groups: &[GroupSummary]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for g in groups.iter() {
        let mut m: JSMap<String, JSValue> = JSMap::new();
        m.insert("id".to_string(), json!(g.id));
        m.insert("name".to_string(), json!(g.name));
        m.extend(summary_fields(&g.summary));
        l.push(JSValue::Object(m));
    }
    l
}

fn report_to_json(report: &Report) -> JSValue {
    let by_month: Vec<JSValue> = report
        .by_month
        .iter()
        .map(|m| {
            json!({
                "month": m.month,
                "label": m.label,
                "count": m.count,
                "withScore": m.with_score,
                "meanScore": m.mean_score,
            })
        })
        .collect();
    let recent: Vec<JSValue> = report
        .recent_responses
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "groupName": r.group_name,
                "unitName": r.unit_name,
                "score": r.score,
                "tier": r.tier.map(|t| t.as_str()),
                "submittedAt": r.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
        })
        .collect();
    json!({
        "overall": JSValue::Object(summary_fields(&report.overall)),
        "byCampaign": groups_to_json(&report.by_campaign),
        "byUnit": groups_to_json(&report.by_unit),
        "byMonth": by_month,
        "recentResponses": recent,
    })
}

fn build_report_js(config: &PulseConfig, rules: &ReportRules, report: &Report) -> JSValue {
    let c = OutputConfig {
        report_name: config.output_settings.report_name.clone(),
        recent_limit: rules.recent_limit,
        utc_offset_minutes: rules.utc_offset_minutes,
    };
    json!({
        "config": c,
        "results": report_to_json(report) })
}

fn read_responses(root_path: &Path, cfs: &FileSource) -> PulseResult<Vec<ResponseRecord>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read response file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json_responses(&p2),
        "csv" => io_csv::read_csv_responses(&p2),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

fn validate_rules(rules: &PulseRules, overrides: &ReportOverrides) -> PulseResult<ReportRules> {
    let defaults = ReportRules::DEFAULT_RULES;
    let res = ReportRules {
        recent_limit: overrides
            .recent_limit
            .or(rules.recent_limit)
            .unwrap_or(defaults.recent_limit),
        utc_offset_minutes: match overrides.utc_offset_minutes.or(rules.utc_offset_minutes) {
            None => defaults.utc_offset_minutes,
            Some(x) if x.abs() < 24 * 60 => x,
            Some(x) => {
                whatever!("utcOffsetMinutes must be less than a day, got {:?}", x)
            }
        },
    };
    Ok(res)
}

// The configuration used when only an input file is given on the command line.
fn config_from_input(input: &str) -> PulseConfig {
    let report_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input)
        .to_string();
    PulseConfig {
        output_settings: OutputSettings {
            report_name,
            output_path: None,
        },
        response_sources: Vec::new(),
        rules: PulseRules::default(),
    }
}

fn write_output(out: Option<&str>, contents: &str, label: &str) -> PulseResult<()> {
    match out {
        None | Some("stdout") => {
            debug!("Printing {}", label);
            println!("{}", contents);
        }
        Some(path) => {
            info!("Writing {} to {:?}", label, path);
            fs::write(path, contents).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

/// Reads the stored responses, computes the report and writes it.
///
/// Returns the report in JSON. If a reference report is provided, the computed
/// report must be identical to it.
pub fn run_report(
    config_path: Option<String>,
    overrides: &ReportOverrides,
    check_summary_path: Option<String>,
) -> PulseResult<JSValue> {
    let (config, config_root): (PulseConfig, PathBuf) = match config_path {
        Some(config_path) => {
            let config_p = Path::new(config_path.as_str());
            let config_str = fs::read_to_string(config_p).context(OpeningJsonSnafu {
                path: config_path.clone(),
            })?;
            let config: PulseConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {
                path: config_path.clone(),
            })?;
            let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
            (config, root_p.to_path_buf())
        }
        None => match overrides.input.as_deref() {
            Some(input) => (config_from_input(input), PathBuf::new()),
            None => {
                whatever!("No responses to read: provide a configuration file or an input file")
            }
        },
    };
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = validate_rules(&config.rules, overrides)?;

    // Files given on the command line are relative to the working directory.
    let (root_p, sources): (PathBuf, Vec<FileSource>) = match overrides.input.clone() {
        Some(input) => (
            PathBuf::new(),
            vec![FileSource {
                provider: overrides
                    .input_type
                    .clone()
                    .unwrap_or_else(|| "json".to_string()),
                file_path: input,
            }],
        ),
        None => (config_root.clone(), config.response_sources.clone()),
    };
    if sources.is_empty() {
        whatever!("No response sources detected");
    }

    let mut data: Vec<ResponseRecord> = Vec::new();
    for cfs in sources.iter() {
        let mut file_data = read_responses(&root_p, cfs)?;
        data.append(&mut file_data);
    }
    debug!("data: {:?}", data);

    let report = build_report(&data, &rules);
    debug!("report {:?}", report);

    // Assemble the final json
    let result_js = build_report_js(&config, &rules, &report);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;

    let out: Option<String> = match overrides.out.clone() {
        Some(o) => Some(o),
        None => config
            .output_settings
            .output_path
            .clone()
            .map(|p| config_root.join(p).display().to_string()),
    };
    write_output(out.as_deref(), &pretty_js_stats, "report")?;

    // The reference report, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        debug!("reference: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference report");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated report and reference report")
        }
    }

    Ok(result_js)
}

/// Asks the questions of a survey on the terminal.
///
/// The submission is written out if the respondent reaches the end, nothing is
/// written if the session is abandoned.
pub fn run_take(
    survey_path: String,
    campaign: Option<String>,
    unit: Option<String>,
    out: Option<String>,
) -> PulseResult<Option<Submission>> {
    let survey = read_survey(&survey_path)?;
    ensure!(
        survey.active,
        InactiveSurveySnafu {
            slug: survey.slug.clone()
        }
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let answers = interactive::run_session(&survey, stdin.lock(), &mut stdout)?;
    let answers = match answers {
        Some(a) => a,
        None => {
            info!("Session on {:?} abandoned, nothing written", survey.slug);
            return Ok(None);
        }
    };

    let campaign_id = campaign.unwrap_or_else(|| "default".to_string());
    let submission = Submission::from_answer_set(&answers, &campaign_id, unit.as_deref());
    let pretty = serde_json::to_string_pretty(&submission).context(WritingJsonSnafu {})?;
    write_output(out.as_deref(), &pretty, "submission")?;
    Ok(Some(submission))
}

/// Prints an error and its trace, if any.
pub fn report_error(e: &PulseError) {
    eprintln!("An error occured {}", e);
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run_report_test(
        test_name: &str,
        config_lpath: &str,
        summary_lpath: &str,
    ) -> PulseResult<JSValue> {
        let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
        info!("Running test {}", test_name);
        let overrides = ReportOverrides {
            // Keep the test output quiet.
            out: Some(std::env::temp_dir().join(format!("{}_report.json", test_name)).display().to_string()),
            ..ReportOverrides::default()
        };
        let res = run_report(
            Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
            &overrides,
            Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        );
        if let Err(e) = &res {
            warn!("Error occured {:?}", e);
            report_error(e);
        }
        res
    }

    fn test_wrapper(test_name: &str) -> PulseResult<JSValue> {
        run_report_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_report.json", test_name).as_str(),
        )
    }

    fn data_path(lpath: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), lpath)
    }

    #[test]
    fn basic_json() {
        init();
        let js = test_wrapper("basic_json").unwrap();
        assert_eq!(js["results"]["overall"]["netScorePercentage"], json!(0));
    }

    #[test]
    fn csv_units() {
        init();
        let js = test_wrapper("csv_units").unwrap();
        assert_eq!(js["results"]["byMonth"][1]["month"], json!("2024-05"));
    }

    #[test]
    fn missing_responses() {
        init();
        let res = test_wrapper("missing_responses");
        assert!(matches!(res, Err(PulseError::MissingResponses { .. })));
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        init();
        let overrides = ReportOverrides {
            out: Some(std::env::temp_dir().join("mismatch_report.json").display().to_string()),
            ..ReportOverrides::default()
        };
        let res = run_report(
            Some(data_path("basic_json/basic_json_config.json")),
            &overrides,
            Some(data_path("csv_units/csv_units_expected_report.json")),
        );
        assert!(matches!(res, Err(PulseError::Whatever { .. })));
    }

    #[test]
    fn command_line_overrides() {
        init();
        let overrides = ReportOverrides {
            input: Some(data_path("basic_json/responses.json")),
            input_type: None,
            out: Some(std::env::temp_dir().join("overrides_report.json").display().to_string()),
            recent_limit: Some(1),
            utc_offset_minutes: Some(120),
        };
        let js = run_report(None, &overrides, None).unwrap();
        assert_eq!(js["config"]["reportName"], json!("responses"));
        assert_eq!(js["config"]["recentLimit"], json!(1));
        assert_eq!(js["results"]["recentResponses"].as_array().map(|a| a.len()), Some(1));
        // The response of Feb 29th at 23:00 UTC falls in March with the offset.
        assert_eq!(js["results"]["byMonth"][1]["count"], json!(1));
        assert_eq!(js["results"]["byMonth"][2]["count"], json!(3));
    }

    #[test]
    fn unknown_provider() {
        init();
        let overrides = ReportOverrides {
            input: Some(data_path("basic_json/responses.json")),
            input_type: Some("xlsx".to_string()),
            ..ReportOverrides::default()
        };
        let res = run_report(None, &overrides, None);
        assert!(matches!(res, Err(PulseError::UnknownProvider { provider }) if provider == "xlsx"));
    }

    #[test]
    fn offset_must_stay_within_a_day() {
        let overrides = ReportOverrides {
            utc_offset_minutes: Some(-1440),
            ..ReportOverrides::default()
        };
        assert!(validate_rules(&PulseRules::default(), &overrides).is_err());
        let overrides = ReportOverrides {
            utc_offset_minutes: Some(-300),
            ..ReportOverrides::default()
        };
        let rules = validate_rules(&PulseRules::default(), &overrides).unwrap();
        assert_eq!(rules.utc_offset_minutes, -300);
        assert_eq!(rules.recent_limit, ReportRules::DEFAULT_RULES.recent_limit);
    }

    #[test]
    fn nothing_to_read() {
        let res = run_report(None, &ReportOverrides::default(), None);
        assert!(matches!(res, Err(PulseError::Whatever { .. })));
    }
}
