// vim: tw=80
//! What a stub does when it is called.
use std::{collections::VecDeque, fmt, rc::Rc};

use crate::{
    error::{Error, Result},
    pattern::CallArgs,
    substitution::Original,
    value::Value
};

/// A computed answer.  It receives the actual call's arguments.
pub type AnswerFn = Rc<dyn Fn(&CallArgs) -> Result<Value>>;

/// One producer in an [`AnswerChain`].
#[derive(Clone)]
pub enum Answer {
    Return(Value),
    /// Fail the call with [`Error::Raised`].
    Raise(Value),
    Invoke(AnswerFn),
    /// Delegate to the original implementation.
    CallOriginal,
}

impl Answer {
    /// Produce the answer for a call to `name` on the double `owner`.
    pub(crate) fn run(&self, owner: &str, name: &str, args: &CallArgs,
                      original: Option<Original>) -> Result<Value>
    {
        match self {
            Answer::Return(v) => Ok(v.clone()),
            Answer::Raise(v) => Err(Error::Raised(v.clone())),
            Answer::Invoke(f) => f(args),
            Answer::CallOriginal => match original {
                Some(o) => o(args),
                None => Err(no_original(owner, name))
            }
        }
    }
}

pub(crate) fn no_original(owner: &str, name: &str) -> Error {
    Error::Answer(format!("{} has no original implementation for '{}'.",
                          owner, name))
}

impl fmt::Debug for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Return(v) => write!(f, "Return({})", v),
            Answer::Raise(v) => write!(f, "Raise({})", v),
            Answer::Invoke(_) => f.write_str("Invoke(..)"),
            Answer::CallOriginal => f.write_str("CallOriginal"),
        }
    }
}

/// The ordered answers of one stub rule.
///
/// Each use consumes the head while more than one answer is queued.  The last
/// answer is reused forever.  An empty chain answers [`Value::None`].
#[derive(Clone, Debug, Default)]
pub struct AnswerChain {
    answers: VecDeque<Answer>,
    used: usize,
}

impl AnswerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    /// Number of answers still queued.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// How many times has the chain answered?
    pub fn used(&self) -> usize {
        self.used
    }

    /// Advance the chain, returning the answer for this use.
    pub(crate) fn advance(&mut self) -> Option<Answer> {
        self.used += 1;
        if self.answers.len() > 1 {
            self.answers.pop_front()
        } else {
            self.answers.front().cloned()
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    fn value(a: Option<Answer>) -> Value {
        a.unwrap().run("m", "f", &CallArgs::default(), None).unwrap()
    }

    #[test]
    fn empty() {
        let mut chain = AnswerChain::new();
        assert!(chain.advance().is_none());
        assert_eq!(chain.used(), 1);
    }

    #[test]
    fn sticky_tail() {
        let mut chain = AnswerChain::new();
        chain.push(Answer::Return(Value::from(1)));
        chain.push(Answer::Return(Value::from(2)));
        assert_eq!(value(chain.advance()), Value::from(1));
        assert_eq!(value(chain.advance()), Value::from(2));
        assert_eq!(value(chain.advance()), Value::from(2));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.used(), 3);
    }

    #[test]
    fn raise() {
        let e = Answer::Raise(Value::from("boom"))
            .run("m", "f", &CallArgs::default(), None)
            .unwrap_err();
        assert_eq!(e, Error::Raised(Value::from("boom")));
    }

    #[test]
    fn call_original_without_original() {
        let e = Answer::CallOriginal
            .run("m", "f", &CallArgs::default(), None)
            .unwrap_err();
        assert_eq!(e.to_string(), "m has no original implementation for 'f'.");
    }

    #[test]
    fn invoke_sees_the_actual_arguments() {
        let f: AnswerFn = Rc::new(|args: &CallArgs| {
            Ok(Value::from(args.positional().len()))
        });
        let args = CallArgs::from_positional(vec![Value::None, Value::None]);
        let v = Answer::Invoke(f).run("m", "f", &args, None).unwrap();
        assert_eq!(v, Value::from(2));
    }
}
