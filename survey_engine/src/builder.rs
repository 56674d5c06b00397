pub use crate::config::*;

use std::collections::HashSet;

/// A builder for survey definitions.
///
/// Questions are asked in the order they are added. Every question id must be
/// unique, and every choice question needs at least one option.
///
/// ```
/// use survey_engine::builder::Builder;
/// use survey_engine::flow::{Cursor, Session};
/// use survey_engine::AnswerValue;
/// # use survey_engine::DefinitionError;
///
/// let survey = Builder::new("s-42", "after-checkout")
///     .score_question("nps", "How likely are you to recommend us to a friend?")?
///     .choice_question("channel", "Where did you buy?", &[("web", "Website"), ("shop", "Shop")])?
///     .build();
///
/// let mut session = Session::start(&survey);
/// session.answer("nps", AnswerValue::Score(9)).unwrap();
/// session.advance().unwrap();
/// session.answer("channel", AnswerValue::Choice("web".to_string())).unwrap();
/// assert_eq!(session.cursor(), Cursor::Review);
/// let answers = session.submit().unwrap();
/// assert_eq!(answers.score(), Some(9));
///
/// # Ok::<(), DefinitionError>(())
/// ```
pub struct Builder {
    pub(crate) _id: String,
    pub(crate) _slug: String,
    pub(crate) _active: bool,
    pub(crate) _questions: Vec<Question>,
}

impl Builder {
    pub fn new(id: &str, slug: &str) -> Builder {
        Builder {
            _id: id.to_string(),
            _slug: slug.to_string(),
            _active: true,
            _questions: Vec::new(),
        }
    }

    /// Marks the survey as closed to new respondents.
    pub fn active(self, active: bool) -> Builder {
        Builder {
            _active: active,
            ..self
        }
    }

    /// Adds a question answered with a score between 0 and 10.
    pub fn score_question(self, id: &str, title: &str) -> Result<Builder, DefinitionError> {
        self.add_question(Question {
            id: id.to_string(),
            title: title.to_string(),
            kind: QuestionKind::Score,
        })
    }

    /// Adds a question answered by picking one of the (id, label) options, in the given order.
    pub fn choice_question(
        self,
        id: &str,
        title: &str,
        options: &[(&str, &str)],
    ) -> Result<Builder, DefinitionError> {
        let options: Vec<ChoiceOption> = options
            .iter()
            .map(|(oid, label)| ChoiceOption {
                id: oid.to_string(),
                label: label.to_string(),
            })
            .collect();
        self.add_question(Question {
            id: id.to_string(),
            title: title.to_string(),
            kind: QuestionKind::Choice(options),
        })
    }

    /// Adds a question that was already assembled, after checking it.
    pub fn add_question(mut self, question: Question) -> Result<Builder, DefinitionError> {
        if self._questions.iter().any(|q| q.id == question.id) {
            return Err(DefinitionError::DuplicateQuestion(question.id));
        }
        if let QuestionKind::Choice(options) = &question.kind {
            if options.is_empty() {
                return Err(DefinitionError::NoOptions(question.id));
            }
            let mut seen: HashSet<&str> = HashSet::new();
            for o in options.iter() {
                if !seen.insert(o.id.as_str()) {
                    return Err(DefinitionError::DuplicateOption {
                        question_id: question.id.clone(),
                        option_id: o.id.clone(),
                    });
                }
            }
        }
        self._questions.push(question);
        Ok(self)
    }

    pub fn build(self) -> Survey {
        Survey {
            id: self._id,
            slug: self._slug,
            active: self._active,
            questions: self._questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let s = Builder::new("1", "slug")
            .choice_question("b", "B", &[("x", "X")])
            .unwrap()
            .score_question("a", "A")
            .unwrap()
            .build();
        let ids: Vec<&str> = s.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(s.active);
        assert_eq!(s.question("a").map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn refuses_duplicates() {
        let res = Builder::new("1", "slug")
            .score_question("a", "A")
            .unwrap()
            .score_question("a", "again");
        assert!(matches!(res, Err(DefinitionError::DuplicateQuestion(q)) if q == "a"));

        let res = Builder::new("1", "slug").choice_question("c", "C", &[("x", "X"), ("x", "Y")]);
        assert!(matches!(
            res,
            Err(DefinitionError::DuplicateOption { option_id, .. }) if option_id == "x"
        ));
    }

    #[test]
    fn refuses_choice_without_options() {
        let res = Builder::new("1", "slug").choice_question("c", "C", &[]);
        assert!(matches!(res, Err(DefinitionError::NoOptions(q)) if q == "c"));
    }

    #[test]
    fn inactive_flag() {
        let s = Builder::new("1", "slug").active(false).build();
        assert!(!s.active);
        assert!(s.is_empty());
    }
}
