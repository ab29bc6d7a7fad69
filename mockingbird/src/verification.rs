// vim: tw=80
//! Quantified expectations over recorded calls.
use std::fmt;

use crate::{
    double::Double,
    error::{Error, Result}
};

/// How many matching calls a verification wants.
///
/// A mode is a stateless policy: [`verify`](VerificationMode::verify) compares
/// it with a count of matching calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerificationMode {
    /// Exactly `n` calls.
    Times(usize),
    /// At least `n` calls, with `n` at least 1.
    ///
    /// `AtLeast(0)` fails [`validate`](VerificationMode::validate).
    AtLeast(usize),
    /// At most `n` calls.
    AtMost(usize),
    /// Between `lo` and `hi` calls, inclusive.
    Between(usize, usize),
}

impl VerificationMode {
    /// The call never happened.
    pub fn never() -> Self {
        VerificationMode::Times(0)
    }

    pub fn lower_bound(&self) -> usize {
        match *self {
            VerificationMode::Times(n) => n,
            VerificationMode::AtLeast(n) => n.max(1),
            VerificationMode::AtMost(_) => 0,
            VerificationMode::Between(lo, _) => lo,
        }
    }

    /// `None` means unbounded.
    pub fn upper_bound(&self) -> Option<usize> {
        match *self {
            VerificationMode::Times(n) => Some(n),
            VerificationMode::AtLeast(_) => None,
            VerificationMode::AtMost(n) => Some(n),
            VerificationMode::Between(_, hi) => Some(hi),
        }
    }

    /// Would `count` matching calls satisfy this mode?
    pub fn satisfied_by(&self, count: usize) -> bool {
        match *self {
            VerificationMode::Times(n) => count == n,
            VerificationMode::AtLeast(n) => count >= n && count > 0,
            VerificationMode::AtMost(n) => count <= n,
            VerificationMode::Between(lo, hi) => lo <= count && count <= hi,
        }
    }

    /// Reject a mode no count can sensibly satisfy: a zero `AtLeast` or
    /// `AtMost`, or a `Between` whose bounds are reversed.
    ///
    /// # Examples
    /// ```
    /// # use mockingbird::{ErrorKind, VerificationMode};
    /// assert!(VerificationMode::Between(1, 3).validate().is_ok());
    /// let e = VerificationMode::Between(3, 1).validate().unwrap_err();
    /// assert_eq!(e.kind(), ErrorKind::Argument);
    /// ```
    pub fn validate(self) -> Result<Self> {
        match self {
            VerificationMode::AtLeast(0) => Err(invalid_bound("at_least", 0)),
            VerificationMode::AtMost(0) => Err(invalid_bound("at_most", 0)),
            VerificationMode::Between(lo, hi) if hi < lo =>
                Err(invalid_between(lo, hi)),
            mode => Ok(mode)
        }
    }

    /// Check `count` matching calls of `wanted`.
    pub fn verify(&self, wanted: &Wanted, count: usize) -> Result<()> {
        if self.satisfied_by(count) {
            return Ok(());
        }
        let message = match *self {
            VerificationMode::Times(_) | VerificationMode::AtLeast(_)
                if count == 0 => wanted.not_invoked(),
            VerificationMode::Times(0) => format!(
                "Unwanted invocation of {}, times: {}", wanted.call, count),
            VerificationMode::Times(n) => format!(
                "Wanted times: {}, actual times: {}", n, count),
            VerificationMode::AtLeast(n) => format!(
                "Wanted at least: {}, actual times: {}", n, count),
            VerificationMode::AtMost(n) => format!(
                "Wanted at most: {}, actual times: {}", n, count),
            VerificationMode::Between(lo, hi) => format!(
                "Wanted between: [{}, {}], actual times: {}", lo, hi, count),
        };
        Err(Error::Verification {
            wanted: wanted.call.clone(),
            mode: Some(*self),
            actual: Some(count),
            found: wanted.found.clone(),
            seen: wanted.seen.clone(),
            message
        })
    }
}

/// `Times(n)`
impl From<usize> for VerificationMode {
    fn from(n: usize) -> Self {
        VerificationMode::Times(n)
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            VerificationMode::Times(n) => write!(f, "<Times wanted={}>", n),
            VerificationMode::AtLeast(n) =>
                write!(f, "<AtLeast wanted={}>", n),
            VerificationMode::AtMost(n) => write!(f, "<AtMost wanted={}>", n),
            VerificationMode::Between(lo, hi) =>
                write!(f, "<Between [{}, {}]>", lo, hi),
        }
    }
}

/// The invocation a verification looks for, the calls that matched it, and
/// the calls it may cite when it was never made.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Wanted {
    /// The wanted call, rendered.
    pub call: String,
    /// Matching calls, rendered.
    pub found: Vec<String>,
    /// Calls to the same member, or every call when there are none.
    pub seen: Vec<String>,
}

impl Wanted {
    pub fn new(call: impl Into<String>, seen: Vec<String>) -> Self {
        Wanted{call: call.into(), found: Vec::new(), seen}
    }

    pub fn with_found(mut self, found: Vec<String>) -> Self {
        self.found = found;
        self
    }

    fn not_invoked(&self) -> String {
        let mut message = format!("Wanted but not invoked:\n\n    {}\n",
                                  self.call);
        if !self.seen.is_empty() {
            message.push_str(&format!("\nInstead got:\n\n    {}\n",
                                      self.seen.join("\n    ")));
        }
        message
    }
}

/// Verification options as a caller might spell them, with signed counts.
///
/// At most one of the four may be given; none means "exactly once".
///
/// # Examples
/// ```
/// # use mockingbird::{VerificationMode, VerifyOptions};
/// let opts = VerifyOptions{at_most: Some(2), ..Default::default()};
/// assert_eq!(opts.mode().unwrap(), VerificationMode::AtMost(2));
/// let opts = VerifyOptions{times: Some(-1), ..Default::default()};
/// assert!(opts.mode().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerifyOptions {
    pub times: Option<i64>,
    pub at_least: Option<i64>,
    pub at_most: Option<i64>,
    pub between: Option<(i64, i64)>,
}

impl VerifyOptions {
    /// Validate the options and turn them into a mode.
    pub fn mode(&self) -> Result<VerificationMode> {
        let given = [self.times.is_some(), self.at_least.is_some(),
                     self.at_most.is_some(), self.between.is_some()];
        if given.iter().filter(|g| **g).count() > 1 {
            return Err(Error::argument(
                "You can set only one of the arguments: 'times', \
                 'at_least', 'at_most' or 'between'."));
        }
        if let Some(n) = self.times {
            let n = usize::try_from(n).map_err(|_| Error::argument(format!(
                "'times' argument has invalid value.\nIt should be at least \
                 0. You wanted to set it to: {}", n)))?;
            return Ok(VerificationMode::Times(n));
        }
        if let Some(n) = self.at_least {
            return at_least_one("at_least", n).map(VerificationMode::AtLeast);
        }
        if let Some(n) = self.at_most {
            return at_least_one("at_most", n).map(VerificationMode::AtMost);
        }
        if let Some((lo, hi)) = self.between {
            return match (usize::try_from(lo), usize::try_from(hi)) {
                (Ok(lo), Ok(hi)) => VerificationMode::Between(lo, hi)
                    .validate(),
                _ => Err(invalid_between(lo, hi))
            };
        }
        Ok(VerificationMode::Times(1))
    }
}

fn at_least_one(arg: &str, n: i64) -> Result<usize> {
    match usize::try_from(n) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid_bound(arg, n))
    }
}

fn invalid_bound(arg: &str, n: impl fmt::Display) -> Error {
    Error::argument(format!(
        "'{}' argument has invalid value.\nIt should be at least 1. You \
         wanted to set it to: {}", arg, n))
}

fn invalid_between(lo: impl fmt::Display, hi: impl fmt::Display) -> Error {
    Error::argument(format!(
        "'between' argument has invalid value.\nIt should consist of \
         non-negative values with the second not less than the first, e.g. \
         [1, 4] or [0, 3] or [2, 2].\nYou wanted to set it to: [{}, {}]",
        lo, hi))
}

/// Fail on the first call to any of `doubles` that no verification claimed.
pub fn verify_no_more_interactions(doubles: &[&Double]) -> Result<()> {
    doubles.iter().try_for_each(|d| d.ensure_no_unverified_interactions())
}

/// Alias of [`verify_no_more_interactions`].
pub fn verify_zero_interactions(doubles: &[&Double]) -> Result<()> {
    verify_no_more_interactions(doubles)
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn wanted() -> Wanted {
        Wanted::new("bark(\"Miau\")", vec!["bark(\"Wuff\")".to_owned()])
    }

    fn message(mode: VerificationMode, count: usize) -> String {
        mode.verify(&wanted(), count).unwrap_err().to_string()
    }

    #[test]
    fn count_monotonicity() {
        for count in 0..6 {
            assert_eq!(VerificationMode::Times(2).satisfied_by(count),
                       count == 2);
            assert_eq!(VerificationMode::AtLeast(2).satisfied_by(count),
                       count >= 2);
            assert_eq!(VerificationMode::AtMost(2).satisfied_by(count),
                       count <= 2);
            assert_eq!(VerificationMode::Between(1, 3).satisfied_by(count),
                       (1..=3).contains(&count));
        }
    }

    #[test]
    fn not_invoked() {
        let expected = "Wanted but not invoked:\n\n    bark(\"Miau\")\n\n\
                        Instead got:\n\n    bark(\"Wuff\")\n";
        assert_eq!(message(VerificationMode::Times(1), 0), expected);
        assert_eq!(message(VerificationMode::AtLeast(3), 0), expected);
        let bare = Wanted::new("bark()", Vec::new());
        let e = VerificationMode::Times(1).verify(&bare, 0).unwrap_err();
        assert_eq!(e.to_string(), "Wanted but not invoked:\n\n    bark()\n");
    }

    #[test]
    fn messages() {
        assert_eq!(message(VerificationMode::never(), 2),
                   "Unwanted invocation of bark(\"Miau\"), times: 2");
        assert_eq!(message(VerificationMode::Times(1), 2),
                   "Wanted times: 1, actual times: 2");
        assert_eq!(message(VerificationMode::AtLeast(3), 2),
                   "Wanted at least: 3, actual times: 2");
        assert_eq!(message(VerificationMode::AtMost(1), 2),
                   "Wanted at most: 1, actual times: 2");
        assert_eq!(message(VerificationMode::Between(3, 4), 2),
                   "Wanted between: [3, 4], actual times: 2");
    }

    #[test]
    fn error_payload() {
        let found = vec!["bark(\"Miau\")".to_owned(); 2];
        let e = VerificationMode::Times(1)
            .verify(&wanted().with_found(found.clone()), 2)
            .unwrap_err();
        match e {
            Error::Verification{wanted, mode, actual, found: f, seen, ..} => {
                assert_eq!(wanted, "bark(\"Miau\")");
                assert_eq!(mode, Some(VerificationMode::Times(1)));
                assert_eq!(actual, Some(2));
                assert_eq!(f, found);
                assert_eq!(seen, vec!["bark(\"Wuff\")".to_owned()]);
            },
            _ => panic!("unexpected {:?}", e)
        }
    }

    #[test]
    fn validate() {
        for mode in [VerificationMode::never(), VerificationMode::AtLeast(1),
                     VerificationMode::AtMost(1),
                     VerificationMode::Between(0, 0)]
        {
            assert_eq!(mode.validate().unwrap(), mode);
        }
        let e = VerificationMode::Between(3, 1).validate().unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Argument);
        assert_eq!(e.to_string(),
            "'between' argument has invalid value.\nIt should consist of \
             non-negative values with the second not less than the first, \
             e.g. [1, 4] or [0, 3] or [2, 2].\nYou wanted to set it to: [3, 1]");
        assert_eq!(VerificationMode::AtLeast(0).validate().unwrap_err()
                   .to_string(),
                   "'at_least' argument has invalid value.\nIt should be at \
                    least 1. You wanted to set it to: 0");
        assert_eq!(VerificationMode::AtMost(0).validate().unwrap_err().kind(),
                   ErrorKind::Argument);
    }

    #[test]
    fn display() {
        assert_eq!(VerificationMode::Times(1).to_string(), "<Times wanted=1>");
        assert_eq!(VerificationMode::AtLeast(2).to_string(),
                   "<AtLeast wanted=2>");
        assert_eq!(VerificationMode::AtMost(3).to_string(),
                   "<AtMost wanted=3>");
        assert_eq!(VerificationMode::Between(1, 2).to_string(),
                   "<Between [1, 2]>");
    }

    #[test]
    fn bounds() {
        assert_eq!(VerificationMode::never().lower_bound(), 0);
        assert_eq!(VerificationMode::Between(0, 3).lower_bound(), 0);
        assert_eq!(VerificationMode::AtLeast(2).upper_bound(), None);
        assert_eq!(VerificationMode::from(4), VerificationMode::Times(4));
    }

    fn invalid(opts: VerifyOptions) -> String {
        let e = opts.mode().unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Argument);
        e.to_string()
    }

    #[test]
    fn options() {
        assert_eq!(VerifyOptions::default().mode().unwrap(),
                   VerificationMode::Times(1));
        let opts = VerifyOptions{between: Some((0, 3)), ..Default::default()};
        assert_eq!(opts.mode().unwrap(), VerificationMode::Between(0, 3));
        let opts = VerifyOptions{times: Some(0), ..Default::default()};
        assert_eq!(opts.mode().unwrap(), VerificationMode::never());
    }

    #[test]
    fn invalid_options() {
        assert_eq!(
            invalid(VerifyOptions{times: Some(-1), ..Default::default()}),
            "'times' argument has invalid value.\nIt should be at least 0. \
             You wanted to set it to: -1");
        assert_eq!(
            invalid(VerifyOptions{at_least: Some(1), at_most: Some(2),
                                  ..Default::default()}),
            "You can set only one of the arguments: 'times', 'at_least', \
             'at_most' or 'between'.");
        assert_eq!(
            invalid(VerifyOptions{at_least: Some(0), ..Default::default()}),
            "'at_least' argument has invalid value.\nIt should be at least \
             1. You wanted to set it to: 0");
        invalid(VerifyOptions{at_most: Some(-2), ..Default::default()});
        invalid(VerifyOptions{between: Some((3, 1)), ..Default::default()});
        invalid(VerifyOptions{between: Some((-1, 1)), ..Default::default()});
    }
}
