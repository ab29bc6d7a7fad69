// vim: tw=80
//! Per-double storage of recorded calls and stub rules.
use std::rc::Rc;

use crate::{
    invocation::{ActualInvocation, DeclaredInvocation},
    pattern::ArgumentPattern,
    verification::VerificationMode
};

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    actuals: Vec<Rc<ActualInvocation>>,
    declared: Vec<DeclaredInvocation>,
    next_id: usize,
    next_seq: u64,
}

impl Ledger {
    /// Declare a rule.  An identical (name, pattern) rule is rebound instead:
    /// it gets a fresh chain and becomes the most recent declaration.  Returns
    /// the rule's id and the rule it replaced, if any.
    pub fn declare(&mut self, name: &str, pattern: ArgumentPattern,
                   expected: Option<VerificationMode>)
        -> (usize, Option<DeclaredInvocation>)
    {
        let seq = self.next_seq;
        self.next_seq += 1;
        let existing = self.declared.iter_mut()
            .find(|d| d.name() == name && *d.pattern() == pattern);
        match existing {
            Some(d) => {
                let id = d.id;
                let fresh = DeclaredInvocation::new(id, name, pattern,
                                                    expected, seq);
                let old = std::mem::replace(d, fresh);
                (id, Some(old))
            },
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.declared.push(DeclaredInvocation::new(id, name, pattern,
                                                           expected, seq));
                (id, None)
            }
        }
    }

    pub fn rule(&self, id: usize) -> Option<&DeclaredInvocation> {
        self.declared.iter().find(|d| d.id == id)
    }

    pub fn rule_mut(&mut self, id: usize) -> Option<&mut DeclaredInvocation> {
        self.declared.iter_mut().find(|d| d.id == id)
    }

    pub fn remove(&mut self, id: usize) -> Option<DeclaredInvocation> {
        let i = self.declared.iter().position(|d| d.id == id)?;
        Some(self.declared.remove(i))
    }

    /// Put back a rule that a scoped declaration replaced.
    pub fn restore(&mut self, rule: DeclaredInvocation) {
        match self.declared.iter_mut().find(|d| d.id == rule.id) {
            Some(d) => *d = rule,
            None => self.declared.push(rule)
        }
    }

    pub fn record(&mut self, actual: Rc<ActualInvocation>) {
        self.actuals.push(actual);
    }

    /// Every recorded call, in call order.
    pub fn actuals(&self) -> &[Rc<ActualInvocation>] {
        &self.actuals
    }

    /// Recorded calls to `name`, in call order.
    pub fn all_actuals(&self, name: &str) -> Vec<Rc<ActualInvocation>> {
        self.actuals.iter()
            .filter(|a| a.name() == name)
            .cloned()
            .collect()
    }

    pub fn declared(&self) -> &[DeclaredInvocation] {
        &self.declared
    }

    pub fn declared_mut(&mut self) -> &mut [DeclaredInvocation] {
        &mut self.declared
    }

    /// Rules for `name`, most recently declared first.
    pub fn all_declared(&self, name: &str) -> Vec<&DeclaredInvocation> {
        let mut v = self.declared.iter()
            .filter(|d| d.name() == name)
            .collect::<Vec<_>>();
        v.sort_by(|a, b| b.seq.cmp(&a.seq));
        v
    }

    pub fn has_rules_for(&self, name: &str) -> bool {
        self.declared.iter().any(|d| d.name() == name)
    }

    pub fn clear_actuals(&mut self) {
        self.actuals.clear();
    }

    pub fn clear_declared(&mut self) {
        self.declared.clear();
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{args, matcher::any, pattern::ANY_REST};

    fn pattern(a: crate::pattern::Args) -> ArgumentPattern {
        ArgumentPattern::new(a).unwrap()
    }

    #[test]
    fn redeclaring_rebinds() {
        let mut ledger = Ledger::default();
        let (a, replaced) = ledger.declare("f", pattern(args!(1)), None);
        assert!(replaced.is_none());
        ledger.rule_mut(a).unwrap().used = 3;
        ledger.declare("g", pattern(args!(1)), None);
        let (b, replaced) = ledger.declare("f", pattern(args!(1)), None);
        assert_eq!(a, b);
        assert_eq!(replaced.unwrap().used(), 3);
        assert_eq!(ledger.declared().len(), 2);
        assert_eq!(ledger.rule(a).unwrap().used(), 0);
    }

    #[test]
    fn all_declared_is_most_recent_first() {
        let mut ledger = Ledger::default();
        ledger.declare("f", pattern(args!(ANY_REST)), None);
        ledger.declare("f", pattern(args!(any())), None);
        ledger.declare("f", pattern(args!(ANY_REST)), None);
        let rendered = ledger.all_declared("f").iter()
            .map(|d| d.render())
            .collect::<Vec<_>>();
        assert_eq!(rendered, vec!["f(...)", "f(any())"]);
    }

    #[test]
    fn restore_replaced_rule() {
        let mut ledger = Ledger::default();
        let (id, _) = ledger.declare("f", pattern(args!()), None);
        let (_, old) = ledger.declare("f", pattern(args!()), None);
        ledger.rule_mut(id).unwrap().used = 1;
        ledger.restore(old.unwrap());
        assert_eq!(ledger.rule(id).unwrap().used(), 0);
        assert!(ledger.remove(id).is_some());
        assert!(ledger.remove(id).is_none());
        assert!(!ledger.has_rules_for("f"));
    }
}
