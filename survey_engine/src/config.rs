// ********* Survey definition ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// The lowest score accepted by a score question.
pub const MIN_SCORE: i32 = 0;
/// The highest score accepted by a score question.
pub const MAX_SCORE: i32 = 10;

/// One selectable entry of a choice question.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// The two kinds of questions a survey can ask.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum QuestionKind {
    /// An integer answer between `MIN_SCORE` and `MAX_SCORE`, both included.
    Score,
    /// Exactly one of the listed options.
    /// Invariant: the list is never empty when built through the builder.
    Choice(Vec<ChoiceOption>),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_score(&self) -> bool {
        matches!(self.kind, QuestionKind::Score)
    }

    /// The options of a choice question. Empty for score questions.
    pub fn options(&self) -> &[ChoiceOption] {
        match &self.kind {
            QuestionKind::Score => &[],
            QuestionKind::Choice(options) => options,
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.options().iter().find(|o| o.id == option_id)
    }
}

/// An ordered list of questions.
///
/// The position of a question is its index in `questions`. The order is fixed
/// for the whole lifetime of a session.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Survey {
    pub id: String,
    pub slug: String,
    pub active: bool,
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Finds a question and its position.
    pub fn question(&self, question_id: &str) -> Option<(usize, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .find(|(_, q)| q.id == question_id)
    }
}

// ********* Answers ***********

/// The value given to a question.
///
/// Scores are kept as signed integers so that out-of-range input can be
/// reported instead of being truncated.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AnswerValue {
    Score(i32),
    Choice(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// The finished answers of one respondent, in survey order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnswerSet {
    pub survey_slug: String,
    pub answers: Vec<Answer>,
}

impl AnswerSet {
    /// The first score answer. A survey contributes at most one score to a stored response.
    pub fn score(&self) -> Option<i32> {
        self.answers.iter().find_map(|a| match a.value {
            AnswerValue::Score(s) => Some(s),
            AnswerValue::Choice(_) => None,
        })
    }

    /// All the choice answers as (question id, option id) pairs.
    pub fn choices(&self) -> Vec<(&str, &str)> {
        self.answers
            .iter()
            .filter_map(|a| match &a.value {
                AnswerValue::Choice(option_id) => Some((a.question_id.as_str(), option_id.as_str())),
                AnswerValue::Score(_) => None,
            })
            .collect()
    }
}

// ********* Stored responses ***********

/// A response as persisted by the storage layer after a submission.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseRecord {
    pub id: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    /// May be missing (partial submission) or outside of the valid range (bad data).
    pub score: Option<i32>,
    pub submitted_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// The score if it is present and within the accepted range.
    pub fn valid_score(&self) -> Option<u8> {
        match self.score {
            Some(s) if (MIN_SCORE..=MAX_SCORE).contains(&s) => Some(s as u8),
            _ => None,
        }
    }
}

// ******** Output data structures *********

/// Satisfaction tier of a single score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Tier {
    Detractor,
    Passive,
    Promoter,
}

impl Tier {
    /// 0-6 are detractors, 7-8 passives and 9-10 promoters.
    pub fn classify(score: u8) -> Tier {
        match score {
            0..=6 => Tier::Detractor,
            7..=8 => Tier::Passive,
            _ => Tier::Promoter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Detractor => "detractor",
            Tier::Passive => "passive",
            Tier::Promoter => "promoter",
        }
    }
}

/// Statistics over a group of responses.
///
/// `total` counts every response, `with_score` only those carrying a valid score.
#[derive(PartialEq, Debug, Clone)]
pub struct Summary {
    pub total: u64,
    pub with_score: u64,
    pub promoters: u64,
    pub passives: u64,
    pub detractors: u64,
    /// Rounded to one decimal. Absent when no response has a score.
    pub mean_score: Option<f64>,
    /// Rounded to the nearest integer. Absent when no response has a score.
    pub net_score_percentage: Option<i64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub summary: Summary,
}

/// A calendar month, ordered chronologically.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(ts: &DateTime<Utc>) -> MonthKey {
        MonthKey {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// The month of the timestamp once shifted by a fixed offset from UTC.
    pub fn with_offset(ts: &DateTime<Utc>, utc_offset_minutes: i32) -> MonthKey {
        MonthKey::of(&(*ts + Duration::minutes(utc_offset_minutes as i64)))
    }

    /// Stable sort key, for example `2024-01`.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Human readable label, for example `Jan 2024`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b %Y").to_string(),
            None => self.key(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MonthSummary {
    pub month: String,
    pub label: String,
    pub count: u64,
    pub with_score: u64,
    pub mean_score: Option<f64>,
}

/// Lightweight projection of a stored response.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecentResponse {
    pub id: String,
    pub group_name: String,
    pub unit_name: Option<String>,
    pub score: Option<u8>,
    pub tier: Option<Tier>,
    pub submitted_at: DateTime<Utc>,
}

/// Everything a dashboard needs, computed in one pass over the responses.
#[derive(PartialEq, Debug, Clone)]
pub struct Report {
    pub overall: Summary,
    pub by_campaign: Vec<GroupSummary>,
    pub by_unit: Vec<GroupSummary>,
    pub by_month: Vec<MonthSummary>,
    pub recent_responses: Vec<RecentResponse>,
}

// ********* Errors **********

/// Why a value was refused for the current question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnswerRejection {
    /// The cursor is on the review step, there is no question to answer.
    NoCurrentQuestion,
    /// The answer targets another question than the current one.
    WrongQuestion { expected: String, got: String },
    ScoreOutOfRange(i32),
    UnknownOption(String),
    /// A score given to a choice question, or the opposite.
    KindMismatch,
}

impl Display for AnswerRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerRejection::NoCurrentQuestion => write!(f, "no question is being asked"),
            AnswerRejection::WrongQuestion { expected, got } => {
                write!(f, "expected an answer for {}, got {}", expected, got)
            }
            AnswerRejection::ScoreOutOfRange(s) => write!(
                f,
                "score {} is not between {} and {}",
                s, MIN_SCORE, MAX_SCORE
            ),
            AnswerRejection::UnknownOption(o) => write!(f, "unknown option {}", o),
            AnswerRejection::KindMismatch => write!(f, "answer does not fit the question type"),
        }
    }
}

/// Errors returned by the question flow.
///
/// None of them terminates the session: the caller presents the current state again.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FlowError {
    InvalidAnswer(AnswerRejection),
    IncompleteQuestion(String),
    /// The unanswered questions, in survey order.
    IncompleteSurvey(Vec<String>),
    AtStart,
    NotAtReview,
    /// The session was already submitted.
    Terminated,
}

impl Error for FlowError {}

impl Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::InvalidAnswer(r) => write!(f, "Invalid answer: {}", r),
            FlowError::IncompleteQuestion(qid) => write!(f, "Question {} has no answer yet", qid),
            FlowError::IncompleteSurvey(missing) => {
                write!(f, "Unanswered questions: {}", missing.join(", "))
            }
            FlowError::AtStart => write!(f, "Already at the first question"),
            FlowError::NotAtReview => write!(f, "Answers can only be submitted from the review step"),
            FlowError::Terminated => write!(f, "The session was already submitted"),
        }
    }
}

/// Errors found while assembling a survey definition.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DefinitionError {
    DuplicateQuestion(String),
    NoOptions(String),
    DuplicateOption { question_id: String, option_id: String },
}

impl Error for DefinitionError {}

impl Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionError::DuplicateQuestion(qid) => write!(f, "Question {} is defined twice", qid),
            DefinitionError::NoOptions(qid) => write!(f, "Choice question {} has no options", qid),
            DefinitionError::DuplicateOption {
                question_id,
                option_id,
            } => write!(
                f,
                "Option {} is defined twice in question {}",
                option_id, question_id
            ),
        }
    }
}

// ********* Configuration **********

/// Options that control how a report is assembled.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportRules {
    /// How many responses are listed in the recent responses section.
    pub recent_limit: usize,
    /// Timestamps are shifted by this many minutes before being placed in a
    /// calendar month.
    pub utc_offset_minutes: i32,
}

impl ReportRules {
    pub const DEFAULT_RULES: ReportRules = ReportRules {
        recent_limit: 5,
        utc_offset_minutes: 0,
    };
}
