//! Operator decisions during an import.
//!
//! The importer never talks to a terminal. It hands a `Question` to a
//! `Decider` and gets back the raw answer text, which it parses and checks
//! against the offered options itself.

use crate::Result;

/// Answer that asks for a new record built from the source definition
pub const CREATE_NEW: i64 = -1;

/// A numbered list of options put to the operator
#[derive(Clone, Debug)]
pub struct Question {
    /// Shown above the list
    pub title: String,
    /// Shown where the answer is typed
    pub prompt: String,
    /// Option `i` is answered with the number `i`
    pub options: Vec<String>,
    /// Extra answer meaning "create new", if creation is allowed
    pub create_sentinel: Option<i64>,
}

/// What a valid answer selected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Existing(usize),
    CreateNew,
}

impl Question {
    /// Interpret raw answer text; `None` if it is not a valid choice
    pub fn parse(&self, answer: &str) -> Option<Selection> {
        let n: i64 = answer.trim().parse().ok()?;
        if self.create_sentinel == Some(n) {
            return Some(Selection::CreateNew);
        }
        usize::try_from(n)
            .ok()
            .filter(|&i| i < self.options.len())
            .map(Selection::Existing)
    }
}

/// Source of operator answers
pub trait Decider {
    /// Present the question and return the raw answer
    ///
    /// Returns `Error::Selection` when no answer can be produced at all
    /// (closed input, exhausted script).
    fn ask(&mut self, question: &Question) -> Result<String>;

    /// Tell the operator an answer was not accepted
    fn reject(&mut self, _message: &str) {}
}

impl<D: Decider + ?Sized> Decider for &mut D {
    fn ask(&mut self, question: &Question) -> Result<String> {
        (**self).ask(question)
    }

    fn reject(&mut self, message: &str) {
        (**self).reject(message)
    }
}

/// Ask until a valid selection is given
pub fn select(decider: &mut impl Decider, question: &Question) -> Result<Selection> {
    loop {
        let answer = decider.ask(question)?;
        match question.parse(&answer) {
            Some(selection) => return Ok(selection),
            None => {
                tracing::warn!("Rejected answer {:?} to {:?}", answer, question.title);
                decider.reject("Invalid choice");
            }
        }
    }
}

/// Scripted answers, for tests and non-interactive runs
#[derive(Clone, Debug, Default)]
pub struct ScriptedDecider {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<Question>,
    pub rejections: usize,
}

impl ScriptedDecider {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
            rejections: 0,
        }
    }
}

impl Decider for ScriptedDecider {
    fn ask(&mut self, question: &Question) -> Result<String> {
        self.asked.push(question.clone());
        self.answers
            .pop_front()
            .ok_or_else(|| crate::Error::Selection(format!("no answer for {:?}", question.title)))
    }

    fn reject(&mut self, _message: &str) {
        self.rejections += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn question(options: usize, allow_create: bool) -> Question {
        Question {
            title: "Pick one".into(),
            prompt: "Choice".into(),
            options: (0..options).map(|i| format!("option {}", i)).collect(),
            create_sentinel: allow_create.then_some(CREATE_NEW),
        }
    }

    #[test]
    fn test_parse_answers() {
        let q = question(3, true);
        assert_eq!(q.parse("0"), Some(Selection::Existing(0)));
        assert_eq!(q.parse(" 2\n"), Some(Selection::Existing(2)));
        assert_eq!(q.parse("-1"), Some(Selection::CreateNew));
        assert_eq!(q.parse("3"), None);
        assert_eq!(q.parse("-2"), None);
        assert_eq!(q.parse("two"), None);
        assert_eq!(q.parse(""), None);
    }

    #[test]
    fn test_sentinel_only_when_creation_allowed() {
        let q = question(2, false);
        assert_eq!(q.parse("-1"), None);
    }

    #[test]
    fn test_select_reprompts_until_valid() {
        let mut decider = ScriptedDecider::new(["abc", "7", "1"]);
        let selection = select(&mut decider, &question(2, false)).unwrap();

        assert_eq!(selection, Selection::Existing(1));
        assert_eq!(decider.asked.len(), 3);
        assert_eq!(decider.rejections, 2);
    }

    #[test]
    fn test_select_fails_when_answers_run_out() {
        let mut decider = ScriptedDecider::new(["nope"]);
        let err = select(&mut decider, &question(2, true)).unwrap_err();
        assert!(matches!(err, Error::Selection(_)));
    }
}
