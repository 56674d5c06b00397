//! The question flow: one respondent walking through a survey.
//!
//! A [`Session`] owns a snapshot of the survey and a cursor that is either on a
//! question or on the review step that follows the last question. Answers are
//! recorded for the current question only. Going back always forgets the
//! answer of the question that becomes current again.

use log::{debug, info};

use std::collections::HashMap;

use crate::config::*;

/// Where the respondent currently is.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Cursor {
    Question(usize),
    /// Past the last question: answers are shown before submission.
    Review,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Phase {
    Open,
    Submitted,
}

/// The in-progress answers of a single respondent.
///
/// Sessions are not shared: every operation takes `&mut self`, so a session
/// can only be driven by its owner.
#[derive(Debug, Clone)]
pub struct Session {
    survey: Survey,
    cursor: Cursor,
    answers: HashMap<String, AnswerValue>,
    phase: Phase,
}

impl Session {
    /// Starts a session on a snapshot of the survey.
    ///
    /// An empty survey goes directly to the review step.
    pub fn start(survey: &Survey) -> Session {
        let cursor = if survey.is_empty() {
            Cursor::Review
        } else {
            Cursor::Question(0)
        };
        info!(
            "start: survey {:?} with {} questions",
            survey.slug,
            survey.len()
        );
        Session {
            survey: survey.clone(),
            cursor,
            answers: HashMap::new(),
            phase: Phase::Open,
        }
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The question under the cursor, if not on the review step.
    pub fn current_question(&self) -> Option<&Question> {
        match self.cursor {
            Cursor::Question(idx) => self.survey.questions.get(idx),
            Cursor::Review => None,
        }
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Submitted
    }

    /// Records the answer of the current question, replacing any previous one.
    ///
    /// Choice questions move the cursor forward once answered. Score questions
    /// stay in place until `advance` is called.
    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> Result<Cursor, FlowError> {
        self.check_open()?;
        let question = self
            .current_question()
            .ok_or(FlowError::InvalidAnswer(AnswerRejection::NoCurrentQuestion))?;
        if question.id != question_id {
            return Err(FlowError::InvalidAnswer(AnswerRejection::WrongQuestion {
                expected: question.id.clone(),
                got: question_id.to_string(),
            }));
        }
        check_value(question, &value).map_err(FlowError::InvalidAnswer)?;

        let auto_advance = !question.is_score();
        debug!("answer: {:?} -> {:?}", question_id, value);
        self.answers.insert(question_id.to_string(), value);

        if auto_advance {
            self.move_forward();
        }
        Ok(self.cursor)
    }

    /// Moves to the next question, or to the review step after the last one.
    pub fn advance(&mut self) -> Result<Cursor, FlowError> {
        self.check_open()?;
        if let Some(q) = self.current_question() {
            if !self.answers.contains_key(&q.id) {
                return Err(FlowError::IncompleteQuestion(q.id.clone()));
            }
        }
        self.move_forward();
        Ok(self.cursor)
    }

    /// Moves to the previous question and forgets its answer.
    ///
    /// Only the question that becomes current loses its answer, the answers of
    /// the questions before it are kept.
    pub fn back(&mut self) -> Result<Cursor, FlowError> {
        self.check_open()?;
        let new_idx = match self.cursor {
            Cursor::Question(0) => return Err(FlowError::AtStart),
            Cursor::Question(idx) => idx - 1,
            Cursor::Review if self.survey.is_empty() => return Err(FlowError::AtStart),
            Cursor::Review => self.survey.len() - 1,
        };
        self.cursor = Cursor::Question(new_idx);
        let qid = &self.survey.questions[new_idx].id;
        if let Some(previous) = self.answers.remove(qid) {
            debug!("back: cleared answer {:?} of {:?}", previous, qid);
        }
        Ok(self.cursor)
    }

    /// Returns the answers in survey order and closes the session.
    pub fn submit(&mut self) -> Result<AnswerSet, FlowError> {
        self.check_open()?;
        if self.cursor != Cursor::Review {
            return Err(FlowError::NotAtReview);
        }
        let missing: Vec<String> = self
            .survey
            .questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(FlowError::IncompleteSurvey(missing));
        }

        let mut answers: Vec<Answer> = Vec::new();
        for q in self.survey.questions.iter() {
            if let Some(value) = self.answers.get(&q.id) {
                answers.push(Answer {
                    question_id: q.id.clone(),
                    value: value.clone(),
                });
            }
        }
        self.phase = Phase::Submitted;
        info!(
            "submit: survey {:?} completed with {} answers",
            self.survey.slug,
            answers.len()
        );
        Ok(AnswerSet {
            survey_slug: self.survey.slug.clone(),
            answers,
        })
    }

    /// Drops the session without producing anything.
    pub fn abandon(self) {
        info!(
            "abandon: survey {:?} dropped at {:?} with {} answers",
            self.survey.slug,
            self.cursor,
            self.answers.len()
        );
    }

    fn check_open(&self) -> Result<(), FlowError> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Submitted => Err(FlowError::Terminated),
        }
    }

    fn move_forward(&mut self) {
        self.cursor = match self.cursor {
            Cursor::Question(idx) if idx + 1 < self.survey.len() => Cursor::Question(idx + 1),
            _ => Cursor::Review,
        };
    }
}

fn check_value(question: &Question, value: &AnswerValue) -> Result<(), AnswerRejection> {
    match (&question.kind, value) {
        (QuestionKind::Score, AnswerValue::Score(s)) if (MIN_SCORE..=MAX_SCORE).contains(s) => {
            Ok(())
        }
        (QuestionKind::Score, AnswerValue::Score(s)) => Err(AnswerRejection::ScoreOutOfRange(*s)),
        (QuestionKind::Choice(_), AnswerValue::Choice(option_id)) => {
            if question.option(option_id).is_some() {
                Ok(())
            } else {
                Err(AnswerRejection::UnknownOption(option_id.clone()))
            }
        }
        _ => Err(AnswerRejection::KindMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // score, choice, score
    fn survey() -> Survey {
        Builder::new("s1", "checkout")
            .score_question("q1", "How likely are you to recommend us?")
            .unwrap()
            .choice_question(
                "q2",
                "How did you hear about us?",
                &[("o1", "Friend"), ("o2", "Ad")],
            )
            .unwrap()
            .score_question("q3", "How was the delivery?")
            .unwrap()
            .build()
    }

    fn choice_only() -> Survey {
        Builder::new("s2", "onboarding")
            .choice_question("c1", "First", &[("a", "A"), ("b", "B")])
            .unwrap()
            .choice_question("c2", "Second", &[("a", "A"), ("b", "B")])
            .unwrap()
            .build()
    }

    #[test]
    fn start_on_first_question() {
        init();
        let s = Session::start(&survey());
        assert_eq!(s.cursor(), Cursor::Question(0));
        assert_eq!(s.answer_count(), 0);
        assert_eq!(s.current_question().map(|q| q.id.as_str()), Some("q1"));
    }

    #[test]
    fn empty_survey_starts_at_review() {
        let empty = Builder::new("s0", "empty").build();
        let mut s = Session::start(&empty);
        assert_eq!(s.cursor(), Cursor::Review);
        assert_eq!(s.back(), Err(FlowError::AtStart));
        let res = s.submit().unwrap();
        assert!(res.answers.is_empty());
    }

    #[test]
    fn full_traversal_reaches_review_and_submits() {
        init();
        let mut s = Session::start(&survey());
        s.answer("q1", AnswerValue::Score(9)).unwrap();
        assert_eq!(s.advance(), Ok(Cursor::Question(1)));
        // Choices move forward by themselves.
        assert_eq!(
            s.answer("q2", AnswerValue::Choice("o2".to_string())),
            Ok(Cursor::Question(2))
        );
        s.answer("q3", AnswerValue::Score(4)).unwrap();
        assert_eq!(s.advance(), Ok(Cursor::Review));

        let res = s.submit().unwrap();
        assert_eq!(res.survey_slug, "checkout");
        let ids: Vec<&str> = res.answers.iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
        assert_eq!(res.score(), Some(9));
        assert_eq!(res.choices(), vec![("q2", "o2")]);
        assert!(s.is_terminated());
    }

    #[test]
    fn score_answer_does_not_move() {
        let mut s = Session::start(&survey());
        assert_eq!(s.answer("q1", AnswerValue::Score(7)), Ok(Cursor::Question(0)));
        // Replacing the answer keeps a single entry.
        s.answer("q1", AnswerValue::Score(8)).unwrap();
        assert_eq!(s.answer_count(), 1);
        assert_eq!(s.answer_for("q1"), Some(&AnswerValue::Score(8)));
    }

    #[test]
    fn out_of_range_scores_are_refused() {
        let mut s = Session::start(&survey());
        s.answer("q1", AnswerValue::Score(5)).unwrap();
        for bad in [11, -1] {
            assert_eq!(
                s.answer("q1", AnswerValue::Score(bad)),
                Err(FlowError::InvalidAnswer(AnswerRejection::ScoreOutOfRange(bad)))
            );
            assert_eq!(s.answer_count(), 1);
            assert_eq!(s.answer_for("q1"), Some(&AnswerValue::Score(5)));
        }
        assert!(s.answer("q1", AnswerValue::Score(0)).is_ok());
        assert!(s.answer("q1", AnswerValue::Score(10)).is_ok());
    }

    #[test]
    fn answers_are_checked_against_the_current_question() {
        let mut s = Session::start(&survey());
        assert_eq!(
            s.answer("q2", AnswerValue::Choice("o1".to_string())),
            Err(FlowError::InvalidAnswer(AnswerRejection::WrongQuestion {
                expected: "q1".to_string(),
                got: "q2".to_string()
            }))
        );
        assert_eq!(
            s.answer("q1", AnswerValue::Choice("o1".to_string())),
            Err(FlowError::InvalidAnswer(AnswerRejection::KindMismatch))
        );
        s.answer("q1", AnswerValue::Score(3)).unwrap();
        s.advance().unwrap();
        assert_eq!(
            s.answer("q2", AnswerValue::Choice("o9".to_string())),
            Err(FlowError::InvalidAnswer(AnswerRejection::UnknownOption(
                "o9".to_string()
            )))
        );
        assert_eq!(s.cursor(), Cursor::Question(1));
        assert_eq!(s.answer_count(), 1);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut s = Session::start(&survey());
        assert_eq!(s.advance(), Err(FlowError::IncompleteQuestion("q1".to_string())));
        assert_eq!(s.cursor(), Cursor::Question(0));
    }

    #[test]
    fn back_at_start_fails() {
        let mut s = Session::start(&survey());
        assert_eq!(s.back(), Err(FlowError::AtStart));
        s.answer("q1", AnswerValue::Score(2)).unwrap();
        assert_eq!(s.back(), Err(FlowError::AtStart));
        // The failure did not touch the answer.
        assert_eq!(s.answer_count(), 1);
    }

    #[test]
    fn back_after_auto_advance_clears_only_the_revisited_question() {
        let mut s = Session::start(&choice_only());
        s.answer("c1", AnswerValue::Choice("a".to_string())).unwrap();
        s.answer("c2", AnswerValue::Choice("b".to_string())).unwrap();
        assert_eq!(s.cursor(), Cursor::Review);
        assert_eq!(s.answer_count(), 2);

        assert_eq!(s.back(), Ok(Cursor::Question(1)));
        assert_eq!(s.answer_count(), 1);
        assert_eq!(s.answer_for("c2"), None);
        assert_eq!(s.answer_for("c1"), Some(&AnswerValue::Choice("a".to_string())));

        assert_eq!(s.back(), Ok(Cursor::Question(0)));
        assert_eq!(s.answer_count(), 0);
    }

    #[test]
    fn back_onto_unanswered_question_removes_nothing() {
        let mut s = Session::start(&survey());
        s.answer("q1", AnswerValue::Score(6)).unwrap();
        s.advance().unwrap();
        s.answer("q2", AnswerValue::Choice("o1".to_string())).unwrap();
        // At q3, nothing recorded yet. Going back lands on q2.
        s.back().unwrap();
        assert_eq!(s.answer_count(), 1);
        // q2 is unanswered now, going back again clears q1.
        s.back().unwrap();
        assert_eq!(s.answer_count(), 0);
    }

    #[test]
    fn submit_only_from_review() {
        let mut s = Session::start(&survey());
        s.answer("q1", AnswerValue::Score(10)).unwrap();
        assert_eq!(s.submit(), Err(FlowError::NotAtReview));
        assert!(!s.is_terminated());
    }

    #[test]
    fn revisited_question_must_be_answered_again() {
        let mut s = Session::start(&choice_only());
        s.answer("c1", AnswerValue::Choice("a".to_string())).unwrap();
        s.answer("c2", AnswerValue::Choice("a".to_string())).unwrap();
        s.back().unwrap();
        s.back().unwrap();
        s.answer("c1", AnswerValue::Choice("b".to_string())).unwrap();
        assert_eq!(s.cursor(), Cursor::Question(1));
        s.answer("c2", AnswerValue::Choice("b".to_string())).unwrap();
        // Going back from review and forth again without answering is refused.
        s.back().unwrap();
        assert_eq!(s.advance(), Err(FlowError::IncompleteQuestion("c2".to_string())));
        s.answer("c2", AnswerValue::Choice("a".to_string())).unwrap();
        let res = s.submit().unwrap();
        assert_eq!(res.choices(), vec![("c1", "b"), ("c2", "a")]);
    }

    #[test]
    fn submit_reports_missing_answers() {
        let mut s = Session::start(&survey());
        s.answer("q1", AnswerValue::Score(9)).unwrap();
        s.advance().unwrap();
        s.answer("q2", AnswerValue::Choice("o1".to_string())).unwrap();
        s.answer("q3", AnswerValue::Score(9)).unwrap();
        s.advance().unwrap();
        s.answers.remove("q1");
        s.answers.remove("q3");
        assert_eq!(
            s.submit(),
            Err(FlowError::IncompleteSurvey(vec![
                "q1".to_string(),
                "q3".to_string()
            ]))
        );
        assert!(!s.is_terminated());
    }

    #[test]
    fn answering_at_review_is_refused() {
        let mut s = Session::start(&choice_only());
        s.answer("c1", AnswerValue::Choice("a".to_string())).unwrap();
        s.answer("c2", AnswerValue::Choice("a".to_string())).unwrap();
        assert_eq!(
            s.answer("c2", AnswerValue::Choice("b".to_string())),
            Err(FlowError::InvalidAnswer(AnswerRejection::NoCurrentQuestion))
        );
        // Advancing on the review step stays there.
        assert_eq!(s.advance(), Ok(Cursor::Review));
    }

    #[test]
    fn submitted_session_is_closed() {
        let mut s = Session::start(&choice_only());
        s.answer("c1", AnswerValue::Choice("a".to_string())).unwrap();
        s.answer("c2", AnswerValue::Choice("a".to_string())).unwrap();
        s.submit().unwrap();
        assert_eq!(s.back(), Err(FlowError::Terminated));
        assert_eq!(s.advance(), Err(FlowError::Terminated));
        assert_eq!(s.submit(), Err(FlowError::Terminated));
        assert_eq!(
            s.answer("c1", AnswerValue::Choice("a".to_string())),
            Err(FlowError::Terminated)
        );
    }

    #[test]
    fn session_keeps_its_snapshot() {
        let mut definition = survey();
        let mut s = Session::start(&definition);
        definition.questions.clear();
        assert_eq!(s.survey().len(), 3);
        s.answer("q1", AnswerValue::Score(1)).unwrap();
        s.abandon();
    }
}
