// Line-oriented driver for a question flow session.

use std::io::{BufRead, Write};

use survey_engine::flow::{Cursor, Session};

use crate::pulse::*;

// What a line typed by the respondent means.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Input {
    Quit,
    Back,
    Next,
    Submit,
    Value(String),
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | ":next" => Input::Next,
        ":back" => Input::Back,
        ":submit" => Input::Submit,
        ":quit" => Input::Quit,
        x => Input::Value(x.to_string()),
    }
}

// Choice options may be given by id or by their 1-based position.
fn to_answer_value(question: &Question, raw: &str) -> Option<AnswerValue> {
    match &question.kind {
        QuestionKind::Score => raw.parse::<i32>().ok().map(AnswerValue::Score),
        QuestionKind::Choice(options) => {
            if question.option(raw).is_some() {
                return Some(AnswerValue::Choice(raw.to_string()));
            }
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 && n <= options.len() => {
                    Some(AnswerValue::Choice(options[n - 1].id.clone()))
                }
                // Unknown ids are passed along so that the session reports them.
                _ => Some(AnswerValue::Choice(raw.to_string())),
            }
        }
    }
}

fn describe(question: &Question, value: &AnswerValue) -> String {
    match value {
        AnswerValue::Score(s) => s.to_string(),
        AnswerValue::Choice(oid) => question
            .option(oid)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| oid.clone()),
    }
}

fn prompt<W: Write>(session: &Session, output: &mut W) -> std::io::Result<()> {
    let survey = session.survey();
    match session.cursor() {
        Cursor::Question(idx) => {
            let q = &survey.questions[idx];
            writeln!(output, "[{}/{}] {}", idx + 1, survey.len(), q.title)?;
            match &q.kind {
                QuestionKind::Score => writeln!(output, "  ({} - {})", MIN_SCORE, MAX_SCORE)?,
                QuestionKind::Choice(options) => {
                    for (pos, o) in options.iter().enumerate() {
                        writeln!(output, "  {}) {} [{}]", pos + 1, o.label, o.id)?;
                    }
                }
            }
            if let Some(v) = session.answer_for(&q.id) {
                writeln!(
                    output,
                    "  current answer: {} (empty line to continue)",
                    describe(q, v)
                )?;
            }
        }
        Cursor::Review => {
            writeln!(output, "Review your answers:")?;
            for q in survey.questions.iter() {
                let answer = session
                    .answer_for(&q.id)
                    .map(|v| describe(q, v))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(output, "  {}: {}", q.title, answer)?;
            }
            writeln!(
                output,
                "Press enter or type :submit to send, :back to change the last answer."
            )?;
        }
    }
    output.flush()
}

/// Runs a session until it is submitted or abandoned.
///
/// Returns `None` when the respondent quits or the input ends first.
pub fn run_session<R: BufRead, W: Write>(
    survey: &Survey,
    input: R,
    output: &mut W,
) -> PulseResult<Option<AnswerSet>> {
    let mut session = Session::start(survey);
    let mut lines = input.lines();
    loop {
        prompt(&session, output).context(ConsoleSnafu {})?;
        let line = match lines.next() {
            Some(l) => l.context(ConsoleSnafu {})?,
            None => {
                writeln!(output, "Input closed, answers discarded.").context(ConsoleSnafu {})?;
                session.abandon();
                return Ok(None);
            }
        };

        let at_review = session.cursor() == Cursor::Review;
        let res: Result<(), FlowError> = match parse_input(&line) {
            Input::Quit => {
                writeln!(output, "Answers discarded.").context(ConsoleSnafu {})?;
                session.abandon();
                return Ok(None);
            }
            Input::Back => session.back().map(|_| ()),
            Input::Next if at_review => match session.submit() {
                Ok(answers) => {
                    writeln!(output, "Thank you!").context(ConsoleSnafu {})?;
                    return Ok(Some(answers));
                }
                Err(e) => Err(e),
            },
            Input::Submit => match session.submit() {
                Ok(answers) => {
                    writeln!(output, "Thank you!").context(ConsoleSnafu {})?;
                    return Ok(Some(answers));
                }
                Err(e) => Err(e),
            },
            Input::Next => session.advance().map(|_| ()),
            Input::Value(raw) => match session.current_question().cloned() {
                None => {
                    writeln!(output, "Nothing to answer here.").context(ConsoleSnafu {})?;
                    Ok(())
                }
                Some(q) => match to_answer_value(&q, &raw) {
                    Some(value) => session.answer(&q.id, value).map(|_| ()),
                    None => {
                        writeln!(
                            output,
                            "Please type a number between {} and {}.",
                            MIN_SCORE, MAX_SCORE
                        )
                        .context(ConsoleSnafu {})?;
                        Ok(())
                    }
                },
            },
        };
        if let Err(e) = res {
            debug!("run_session: {:?}", e);
            writeln!(output, "{}", e).context(ConsoleSnafu {})?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;
    use survey_engine::builder::Builder;

    fn survey() -> Survey {
        Builder::new("s1", "after-checkout")
            .score_question("nps", "How likely are you to recommend us?")
            .unwrap()
            .choice_question("channel", "Where did you buy?", &[("web", "Website"), ("shop", "Shop")])
            .unwrap()
            .build()
    }

    fn run(script: &str) -> (Option<AnswerSet>, String) {
        let mut out: Vec<u8> = Vec::new();
        let res = run_session(&survey(), IoCursor::new(script.as_bytes()), &mut out).unwrap();
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn answers_by_position() {
        let (res, out) = run("9\n\n2\n\n");
        let answers = res.unwrap();
        assert_eq!(answers.score(), Some(9));
        assert_eq!(answers.choices(), vec![("channel", "shop")]);
        assert!(out.contains("Review your answers:"));
        assert!(out.contains("Where did you buy?: Shop"));
        assert!(out.contains("Thank you!"));
    }

    #[test]
    fn errors_are_shown_and_asked_again() {
        let (res, out) = run("\n11\nabc\n:back\n:submit\n10\n:next\ncard\nweb\n:submit\n");
        assert!(out.contains("Question nps has no answer yet"));
        assert!(out.contains("score 11 is not between 0 and 10"));
        assert!(out.contains("Please type a number between 0 and 10."));
        assert!(out.contains("Already at the first question"));
        assert!(out.contains("Answers can only be submitted from the review step"));
        assert!(out.contains("unknown option card"));
        let answers = res.unwrap();
        assert_eq!(answers.score(), Some(10));
        assert_eq!(answers.choices(), vec![("channel", "web")]);
    }

    #[test]
    fn back_clears_the_revisited_answer() {
        let (res, out) = run("5\n\nweb\n:back\n\n1\n\n");
        // After going back from the review step, the choice has to be given again.
        assert!(out.contains("Question channel has no answer yet"));
        let answers = res.unwrap();
        assert_eq!(answers.choices(), vec![("channel", "web")]);
    }

    #[test]
    fn quitting_or_closing_discards() {
        let (res, out) = run("7\n:quit\n");
        assert!(res.is_none());
        assert!(out.contains("Answers discarded."));
        let (res, out) = run("7\n");
        assert!(res.is_none());
        assert!(out.contains("Input closed"));
    }
}
