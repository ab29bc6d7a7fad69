// vim: tw=80
//! Recorded calls and declared stub rules.
use std::cell::Cell;

use crate::{
    answer::AnswerChain,
    pattern::{ArgumentPattern, CallArgs},
    verification::VerificationMode
};

/// A concrete call observed by a double.
#[derive(Debug)]
pub struct ActualInvocation {
    double_id: usize,
    double_name: String,
    name: String,
    args: CallArgs,
    verified: Cell<bool>,
    verified_in_order: Cell<bool>,
}

impl ActualInvocation {
    pub(crate) fn new(double_id: usize, double_name: &str, name: &str,
                      args: CallArgs) -> Self
    {
        ActualInvocation {
            double_id,
            double_name: double_name.to_owned(),
            name: name.to_owned(),
            args,
            verified: Cell::new(false),
            verified_in_order: Cell::new(false)
        }
    }

    pub(crate) fn double_id(&self) -> usize {
        self.double_id
    }

    /// Name of the double that received the call.
    pub fn double_name(&self) -> &str {
        &self.double_name
    }

    /// The member that was called.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Has a verification claimed this call?
    pub fn verified(&self) -> bool {
        self.verified.get()
    }

    /// Has an in-order verification consumed this call?
    pub fn verified_in_order(&self) -> bool {
        self.verified_in_order.get()
    }

    pub(crate) fn mark_verified(&self) {
        self.verified.set(true);
    }

    pub(crate) fn mark_verified_in_order(&self) {
        self.verified_in_order.set(true);
        self.verified.set(true);
    }

    /// Render as `bark("Miau")`.
    pub fn render(&self) -> String {
        self.args.render(&self.name)
    }

    /// Render as `dog.bark("Miau")`.
    pub fn render_qualified(&self) -> String {
        format!("{}.{}", self.double_name, self.render())
    }
}

/// A stub rule: a pattern bound to an answer chain.
#[derive(Clone, Debug)]
pub struct DeclaredInvocation {
    pub(crate) id: usize,
    name: String,
    pattern: ArgumentPattern,
    pub(crate) chain: AnswerChain,
    expected: Option<VerificationMode>,
    pub(crate) used: usize,
    pub(crate) allow_unused: bool,
    pub(crate) seq: u64,
}

impl DeclaredInvocation {
    pub(crate) fn new(id: usize, name: &str, pattern: ArgumentPattern,
                      expected: Option<VerificationMode>, seq: u64) -> Self
    {
        DeclaredInvocation {
            id,
            name: name.to_owned(),
            pattern,
            chain: AnswerChain::new(),
            expected,
            used: 0,
            allow_unused: false,
            seq
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &ArgumentPattern {
        &self.pattern
    }

    pub fn chain(&self) -> &AnswerChain {
        &self.chain
    }

    /// The expected call count, for rules declared with `expect`.
    pub fn expected(&self) -> Option<VerificationMode> {
        self.expected
    }

    /// How many calls has this rule answered?
    pub fn used(&self) -> usize {
        self.used
    }

    /// May this rule remain unused without failing a usage sweep?
    pub fn allow_unused(&self) -> bool {
        self.allow_unused
    }

    pub fn render(&self) -> String {
        self.pattern.render(&self.name)
    }

    /// Would one more call exceed this rule's expectation?
    pub(crate) fn exhausted(&self) -> bool {
        match self.expected.and_then(|m| m.upper_bound()) {
            Some(hi) => self.used >= hi,
            None => false
        }
    }
}
