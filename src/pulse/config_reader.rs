use crate::pulse::io_common::{parse_timestamp, read_js_score};
use crate::pulse::*;

use serde::{Deserialize, Serialize};
use survey_engine::builder::Builder;

// ********* Report configuration ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

/// The configuration as it is written in the header of a report.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "recentLimit")]
    pub recent_limit: usize,
    #[serde(rename = "utcOffsetMinutes")]
    pub utc_offset_minutes: i32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseRules {
    #[serde(rename = "recentLimit")]
    pub recent_limit: Option<usize>,
    #[serde(rename = "utcOffsetMinutes")]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "responseSources")]
    pub response_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: PulseRules,
}

pub fn read_summary(path: String) -> PulseResult<JSValue> {
    let contents = fs::read_to_string(&path).context(OpeningJsonSnafu { path: path.clone() })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

// ********* Survey definitions ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub id: String,
    pub label: String,
    pub order: Option<i64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub order: Option<i64>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDefinition {
    pub id: String,
    pub slug: String,
    pub active: Option<bool>,
    pub questions: Vec<QuestionDefinition>,
}

impl SurveyDefinition {
    /// Converts the definition, sorting questions and options by their order.
    ///
    /// Entries without an order come last, in the order of the file.
    pub fn to_survey(&self) -> PulseResult<Survey> {
        let mut questions: Vec<&QuestionDefinition> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order.unwrap_or(i64::MAX));

        let mut builder = Builder::new(&self.id, &self.slug).active(self.active.unwrap_or(true));
        for q in questions {
            builder = match q.question_type.as_str() {
                "score" => builder.score_question(&q.id, &q.title),
                "choice" => {
                    let mut options: Vec<&OptionDefinition> = q.options.iter().collect();
                    options.sort_by_key(|o| o.order.unwrap_or(i64::MAX));
                    let pairs: Vec<(&str, &str)> = options
                        .iter()
                        .map(|o| (o.id.as_str(), o.label.as_str()))
                        .collect();
                    builder.choice_question(&q.id, &q.title, &pairs)
                }
                x => {
                    return UnknownQuestionTypeSnafu {
                        question_id: q.id.clone(),
                        question_type: x,
                    }
                    .fail()
                }
            }
            .context(InvalidSurveySnafu {})?;
        }
        Ok(builder.build())
    }
}

pub fn read_survey(path: &str) -> PulseResult<Survey> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let definition: SurveyDefinition =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("survey definition: {:?}", definition);
    definition.to_survey()
}

// ********* Stored responses ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub id: String,
    #[serde(rename = "campaignId")]
    pub campaign_id: String,
    #[serde(rename = "campaignName")]
    pub campaign_name: String,
    #[serde(rename = "unitId")]
    pub unit_id: Option<String>,
    #[serde(rename = "unitName")]
    pub unit_name: Option<String>,
    // Kept loose: bad scores are tolerated and left out of the statistics.
    pub score: Option<JSValue>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: String,
}

impl StoredResponse {
    pub fn to_record(&self) -> PulseResult<ResponseRecord> {
        Ok(ResponseRecord {
            id: self.id.clone(),
            campaign_id: self.campaign_id.clone(),
            campaign_name: self.campaign_name.clone(),
            unit_id: self.unit_id.clone().filter(|s| !s.is_empty()),
            unit_name: self.unit_name.clone().filter(|s| !s.is_empty()),
            score: read_js_score(&self.id, &self.score),
            submitted_at: parse_timestamp(&self.submitted_at)?,
        })
    }
}

/// A document of stored responses.
///
/// `responses` is optional here so that a missing array can be reported as such.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesDocument {
    #[serde(default)]
    pub responses: Option<Vec<StoredResponse>>,
}

// ********* Submissions ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceAnswer {
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(rename = "optionId")]
    pub option_id: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GroupKeys {
    #[serde(rename = "campaignId")]
    pub campaign_id: String,
    #[serde(rename = "unitId", skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
}

/// The finished answers, in the shape expected by the storage layer.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "scoreAnswer", skip_serializing_if = "Option::is_none")]
    pub score_answer: Option<i32>,
    #[serde(rename = "choiceAnswers")]
    pub choice_answers: Vec<ChoiceAnswer>,
    #[serde(rename = "groupKeys")]
    pub group_keys: GroupKeys,
}

impl Submission {
    pub fn from_answer_set(answers: &AnswerSet, campaign_id: &str, unit_id: Option<&str>) -> Submission {
        Submission {
            score_answer: answers.score(),
            choice_answers: answers
                .choices()
                .into_iter()
                .map(|(question_id, option_id)| ChoiceAnswer {
                    question_id: question_id.to_string(),
                    option_id: option_id.to_string(),
                })
                .collect(),
            group_keys: GroupKeys {
                campaign_id: campaign_id.to_string(),
                unit_id: unit_id.map(|s| s.to_string()),
            },
        }
    }
}
