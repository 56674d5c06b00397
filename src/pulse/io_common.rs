// Helpers shared by the response readers.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value as JSValue;
use snafu::ResultExt;

use crate::pulse::{ParsingTimestampSnafu, PulseResult};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads a timestamp in RFC 3339 format, with any offset.
pub fn parse_timestamp(s: &str) -> PulseResult<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(s.trim()).context(ParsingTimestampSnafu { value: s })?;
    Ok(ts.with_timezone(&Utc))
}

/// Reads a score written as text.
///
/// Scores that are not integers are dropped with a warning. The range is not
/// checked here, out of range scores are left to the aggregation.
pub fn parse_score(response_id: &str, s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<i32>() {
        Ok(x) => Some(x),
        Err(_) => {
            warn!("Response {}: ignoring score {:?}", response_id, s);
            None
        }
    }
}

pub fn read_js_score(response_id: &str, x: &Option<JSValue>) -> Option<i32> {
    match x {
        None | Some(JSValue::Null) => None,
        Some(JSValue::Number(n)) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Some(v),
            None => {
                warn!("Response {}: ignoring score {}", response_id, n);
                None
            }
        },
        Some(JSValue::String(s)) => parse_score(response_id, s),
        Some(other) => {
            warn!("Response {}: ignoring score {:?}", response_id, other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scores() {
        assert_eq!(parse_score("r", " 7 "), Some(7));
        assert_eq!(parse_score("r", "12"), Some(12));
        assert_eq!(parse_score("r", ""), None);
        assert_eq!(parse_score("r", "n/a"), None);
        assert_eq!(read_js_score("r", &Some(json!(9))), Some(9));
        assert_eq!(read_js_score("r", &Some(json!(8.5))), None);
        assert_eq!(read_js_score("r", &Some(json!("10"))), Some(10));
        assert_eq!(read_js_score("r", &Some(json!(null))), None);
        assert_eq!(read_js_score("r", &None), None);
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/data/kiosk.csv"), "kiosk.csv");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
