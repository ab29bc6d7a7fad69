// vim: tw=80
//! Deciding which stub rule governs a call.
//!
//! A rule matches a call when every declared slot accepts the corresponding
//! argument.  When several rules match, the most specific one wins:
//!
//! 1. A rule without rest markers beats one with any.
//! 2. Slot by slot, left to right (positional slots, then keywords by key), a
//!    literal beats a constraining matcher, which beats a bare `any()`, which
//!    beats no slot at all.
//! 3. The most recently declared rule wins the remaining ties.
use std::cmp::Ordering;

use tracing::trace;

use crate::{
    invocation::DeclaredInvocation,
    pattern::{ArgumentPattern, CallArgs, Slot}
};

/// Does `pattern` accept `call`?  Names are not considered.
pub fn rule_matches(pattern: &ArgumentPattern, call: &CallArgs) -> bool {
    let actual = call.positional();
    let mut open_positional = false;
    for (i, slot) in pattern.positional().iter().enumerate() {
        match slot {
            Slot::AnyRest => return true,
            Slot::RestPositional => {
                open_positional = true;
                break;
            },
            _ => match actual.get(i) {
                Some(v) if slot.accepts(v) => (),
                _ => return false
            }
        }
    }
    if !open_positional && actual.len() != pattern.positional().len() {
        return false;
    }

    let kwargs = call.keyword();
    for (key, slot) in pattern.keyword().iter() {
        match kwargs.get(key) {
            Some(v) if slot.accepts(v) => (),
            _ => return false
        }
    }
    pattern.rest_keyword() || kwargs.len() == pattern.keyword().len()
}

/// The rules for `name` that accept `call`.
pub fn find_matches<'a, I>(name: &str, call: &CallArgs, rules: I)
    -> Vec<&'a DeclaredInvocation>
    where I: IntoIterator<Item = &'a DeclaredInvocation>
{
    rules.into_iter()
        .filter(|d| d.name() == name)
        .filter(|d| {
            let matched = rule_matches(d.pattern(), call);
            trace!(rule = %d.render(), matched, "matching");
            matched
        }).collect()
}

/// How much of a call a pattern constrains.  Greater is more specific.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Specificity {
    open: bool,
    tiers: Vec<u8>,
}

impl Specificity {
    pub fn of(pattern: &ArgumentPattern) -> Self {
        let tiers = pattern.positional().iter()
            .chain(pattern.keyword().values())
            .filter(|s| s.tier() > 0)
            .map(Slot::tier)
            .collect();
        Specificity{open: pattern.is_open(), tiers}
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        other.open.cmp(&self.open)
            .then_with(|| self.tiers.cmp(&other.tiers))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pick the authoritative rule among those that match one call.
pub fn select_winner<'a>(matches: &[&'a DeclaredInvocation])
    -> Option<&'a DeclaredInvocation>
{
    matches.iter()
        .copied()
        .max_by(|a, b| {
            Specificity::of(a.pattern()).cmp(&Specificity::of(b.pattern()))
                .then_with(|| a.seq.cmp(&b.seq))
        })
}

/// Could some call match both patterns?  Conservative: slots are only known
/// to be disjoint when both are literals that differ.
pub(crate) fn patterns_overlap(a: &ArgumentPattern, b: &ArgumentPattern)
    -> bool
{
    fn slot_overlap(a: &Slot, b: &Slot) -> bool {
        match (a, b) {
            (Slot::Value(x), Slot::Value(y)) => x == y,
            (Slot::Value(x), Slot::Matcher(m)) |
            (Slot::Matcher(m), Slot::Value(x)) => m.matches(x),
            _ => true
        }
    }

    let (pa, pb) = (a.positional(), b.positional());
    let mut i = 0;
    loop {
        match (pa.get(i), pb.get(i)) {
            (Some(Slot::AnyRest), _) | (_, Some(Slot::AnyRest)) => return true,
            (Some(Slot::RestPositional), _) | (_, Some(Slot::RestPositional))
                => break,
            (Some(x), Some(y)) => {
                if !slot_overlap(x, y) {
                    return false;
                }
            },
            (None, None) => break,
            // One takes more positional arguments than the other allows
            _ => return false
        }
        i += 1;
    }
    for (key, x) in a.keyword() {
        match b.keyword().get(key) {
            Some(y) => if !slot_overlap(x, y) {
                return false;
            },
            None if !b.rest_keyword() => return false,
            None => ()
        }
    }
    b.keyword().keys()
        .all(|key| a.keyword().contains_key(key) || a.rest_keyword())
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{
        args,
        ledger::Ledger,
        matcher::{any, any_of, gt},
        pattern::{Args, ANY_REST, REST_KEYWORD, REST_POSITIONAL},
        value::ValueKind
    };

    fn pattern(a: Args) -> ArgumentPattern {
        ArgumentPattern::new(a).unwrap()
    }

    fn call(a: Args) -> CallArgs {
        CallArgs::new(a).unwrap()
    }

    #[test]
    fn positional_counts_must_agree() {
        assert!(rule_matches(&pattern(args!(1, 2)), &call(args!(1, 2))));
        assert!(!rule_matches(&pattern(args!(1)), &call(args!(1, 2))));
        assert!(!rule_matches(&pattern(args!(1, 2)), &call(args!(1))));
    }

    #[test]
    fn rest_markers() {
        let p = pattern(args!(1, REST_POSITIONAL));
        assert!(rule_matches(&p, &call(args!(1))));
        assert!(rule_matches(&p, &call(args!(1, 2, 3))));
        assert!(!rule_matches(&p, &call(args!(1; k = 2))));
        let p = pattern(args!(REST_KEYWORD; a = 1));
        assert!(rule_matches(&p, &call(args!(; a = 1, b = 2))));
        assert!(!rule_matches(&p, &call(args!(; b = 2))));
        assert!(!rule_matches(&p, &call(args!(3; a = 1))));
        let p = pattern(args!(ANY_REST));
        assert!(rule_matches(&p, &call(args!())));
        assert!(rule_matches(&p, &call(args!(1, 2; x = 3))));
    }

    #[test]
    fn keyword_sets_must_agree() {
        let p = pattern(args!(; a = 1));
        assert!(rule_matches(&p, &call(args!(; a = 1))));
        assert!(!rule_matches(&p, &call(args!(; a = 1, b = 2))));
        assert!(!rule_matches(&p, &call(args!(; a = 2))));
    }

    #[test]
    fn matching_is_not_symmetric() {
        let p = pattern(args!(any()));
        assert!(rule_matches(&p, &call(args!(5))));
        // A literal pattern built from the call always matches the call
        let c = call(args!(5, "x"; k = 1.5));
        assert!(rule_matches(&ArgumentPattern::literal(&c), &c));
        assert!(!rule_matches(&ArgumentPattern::literal(&call(args!(5))),
                              &call(args!(6))));
    }

    fn winner(decls: &[Args], c: Args) -> String {
        let mut ledger = Ledger::default();
        for a in decls {
            ledger.declare("f", pattern(a.clone()), None);
        }
        let c = call(c);
        let matches = find_matches("f", &c, ledger.declared());
        select_winner(&matches).unwrap().render()
    }

    #[test]
    fn closed_beats_open() {
        assert_eq!(winner(&[args!(1, 2), args!(ANY_REST)], args!(1, 2)),
                   "f(1, 2)");
        assert_eq!(winner(&[args!(ANY_REST), args!(1, 2)], args!(1, 2)),
                   "f(1, 2)");
        assert_eq!(winner(&[args!(any()), args!(1, REST_POSITIONAL)],
                          args!(1)),
                   "f(any())");
    }

    #[test]
    fn literal_beats_typed_beats_any() {
        let decls = [args!(any()), args!(any_of(ValueKind::Int)), args!(1)];
        assert_eq!(winner(&decls, args!(1)), "f(1)");
        assert_eq!(winner(&decls, args!(2)), "f(any_of(Int))");
        assert_eq!(winner(&decls, args!("x")), "f(any())");
        assert_eq!(winner(&[args!(gt(0)), args!(any())], args!(3)),
                   "f(gt(0))");
    }

    #[test]
    fn leftmost_slot_decides() {
        assert_eq!(winner(&[args!(any(), 2), args!(1, any())], args!(1, 2)),
                   "f(1, any())");
    }

    #[test]
    fn most_recent_wins_ties() {
        assert_eq!(winner(&[args!(any()), args!(any_of(ValueKind::Int)),
                            args!(gt(0))], args!(1)),
                   "f(gt(0))");
        assert_eq!(winner(&[args!(ANY_REST), args!(REST_POSITIONAL)],
                          args!(1)),
                   "f(*args)");
    }

    #[test]
    fn overlap() {
        let o = |a: Args, b: Args| patterns_overlap(&pattern(a), &pattern(b));
        assert!(o(args!(1), args!(any())));
        assert!(!o(args!(1), args!(2)));
        assert!(!o(args!(1), args!(1, 2)));
        assert!(o(args!(1, REST_POSITIONAL), args!(1, 2)));
        assert!(o(args!(ANY_REST), args!(; k = 1)));
        assert!(!o(args!(; k = 1), args!(; j = 1)));
        assert!(o(args!(REST_KEYWORD; k = 1), args!(; k = 1, j = 1)));
        assert!(!o(args!(gt(5)), args!(3)));
    }
}
