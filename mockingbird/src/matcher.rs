// vim: tw=80
//! Predicates over a single argument value.
//!
//! A [`Matcher`] stands in for a literal argument in a stub or a verification
//! pattern.  All matchers are stateless except for the [`Captor`], which
//! remembers every value it was selected for.
use std::{
    any::{self, TypeId},
    cell::RefCell,
    fmt,
    rc::Rc
};

use cfg_if::cfg_if;
use predicates::prelude::*;

use crate::{
    error::{Error, Result},
    value::{Value, ValueKind}
};

/// What an [`any_of`] or [`instance_of`] matcher requires of its argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TypeTag {
    Kind(ValueKind),
    Opaque(TypeId, &'static str),
}

#[derive(Clone)]
enum Inner {
    Any,
    AnyOf(TypeTag),
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Le(Value),
    Gt(Value),
    Ge(Value),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
    Not(Box<Matcher>),
    Contains(String),
    #[cfg(feature = "regex")]
    Regex(String, Rc<predicates::str::RegexPredicate>),
    ArgThat(Rc<dyn Predicate<Value>>),
    Capture(Captor),
}

/// A predicate standing in for one argument.
#[derive(Clone)]
pub struct Matcher(Inner);

impl Matcher {
    /// Does `value` satisfy this matcher?
    pub fn matches(&self, value: &Value) -> bool {
        match &self.0 {
            Inner::Any => true,
            Inner::AnyOf(TypeTag::Kind(k)) => value.kind() == *k,
            Inner::AnyOf(TypeTag::Opaque(t, _)) =>
                value.opaque_type_id() == Some(*t),
            Inner::Eq(v) => value == v,
            Inner::Ne(v) => value != v,
            Inner::Lt(v) => value < v,
            Inner::Le(v) => value <= v,
            Inner::Gt(v) => value > v,
            Inner::Ge(v) => value >= v,
            Inner::And(ms) => ms.iter().all(|m| m.matches(value)),
            Inner::Or(ms) => ms.iter().any(|m| m.matches(value)),
            Inner::Not(m) => !m.matches(value),
            Inner::Contains(sub) => match value {
                Value::Str(s) if !sub.is_empty() =>
                    predicate::str::contains(sub.as_str()).eval(s.as_str()),
                _ => false
            },
            #[cfg(feature = "regex")]
            Inner::Regex(_, re) => value.as_str()
                .map(|s| re.eval(s))
                .unwrap_or(false),
            Inner::ArgThat(p) => p.eval(value),
            Inner::Capture(c) => c.matches(value),
        }
    }

    /// Record `value` in any captor this matcher holds.  Only called for calls
    /// that were actually selected by a stub or a verification.
    pub(crate) fn capture(&self, value: &Value) {
        if let Inner::Capture(c) = &self.0 {
            c.capture(value.clone());
        }
    }

    /// How strongly this matcher constrains its slot.  A literal is a 3.
    pub(crate) fn tier(&self) -> u8 {
        match &self.0 {
            Inner::Any => 1,
            Inner::Eq(_) => 3,
            Inner::Capture(c) => c.inner.matcher.tier(),
            _ => 2
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn join(f: &mut fmt::Formatter<'_>, ms: &[Matcher]) -> fmt::Result {
    for (i, m) in ms.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", m)?;
    }
    Ok(())
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Any => f.write_str("any()"),
            Inner::AnyOf(TypeTag::Kind(k)) => write!(f, "any_of({:?})", k),
            Inner::AnyOf(TypeTag::Opaque(_, name)) =>
                write!(f, "instance_of({})", name),
            Inner::Eq(v) => write!(f, "eq({})", v),
            Inner::Ne(v) => write!(f, "ne({})", v),
            Inner::Lt(v) => write!(f, "lt({})", v),
            Inner::Le(v) => write!(f, "le({})", v),
            Inner::Gt(v) => write!(f, "gt({})", v),
            Inner::Ge(v) => write!(f, "ge({})", v),
            Inner::And(ms) => {
                f.write_str("and(")?;
                join(f, ms)?;
                f.write_str(")")
            },
            Inner::Or(ms) => {
                f.write_str("or(")?;
                join(f, ms)?;
                f.write_str(")")
            },
            Inner::Not(m) => write!(f, "not({})", m),
            Inner::Contains(sub) => write!(f, "contains({:?})", sub),
            #[cfg(feature = "regex")]
            Inner::Regex(src, _) => write!(f, "matches({:?})", src),
            Inner::ArgThat(p) => write!(f, "arg_that({})", p),
            Inner::Capture(c) => write!(f, "{}", c),
        }
    }
}

/// Matchers are equal when they would be declared the same way.  Custom
/// predicates and captors compare by identity.
impl PartialEq for Matcher {
    fn eq(&self, other: &Matcher) -> bool {
        match (&self.0, &other.0) {
            (Inner::Any, Inner::Any) => true,
            (Inner::AnyOf(a), Inner::AnyOf(b)) => a == b,
            (Inner::Eq(a), Inner::Eq(b)) => a == b,
            (Inner::Ne(a), Inner::Ne(b)) => a == b,
            (Inner::Lt(a), Inner::Lt(b)) => a == b,
            (Inner::Le(a), Inner::Le(b)) => a == b,
            (Inner::Gt(a), Inner::Gt(b)) => a == b,
            (Inner::Ge(a), Inner::Ge(b)) => a == b,
            (Inner::And(a), Inner::And(b)) => a == b,
            (Inner::Or(a), Inner::Or(b)) => a == b,
            (Inner::Not(a), Inner::Not(b)) => a == b,
            (Inner::Contains(a), Inner::Contains(b)) => a == b,
            #[cfg(feature = "regex")]
            (Inner::Regex(a, _), Inner::Regex(b, _)) => a == b,
            (Inner::ArgThat(a), Inner::ArgThat(b)) => Rc::ptr_eq(a, b),
            (Inner::Capture(a), Inner::Capture(b)) => a == b,
            _ => false
        }
    }
}

macro_rules! matcher_from {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Matcher {
                fn from(t: $t) -> Self {
                    Matcher(Inner::Eq(Value::from(t)))
                }
            }
        )*
    }
}
matcher_from!{i8 i16 i32 i64 isize u8 u16 u32 u64 usize bool f32 f64 char}
matcher_from!{&str String}

impl From<Value> for Matcher {
    fn from(v: Value) -> Self {
        Matcher(Inner::Eq(v))
    }
}

impl From<Captor> for Matcher {
    fn from(c: Captor) -> Self {
        Matcher(Inner::Capture(c))
    }
}

/// Matches anything at all.
pub fn any() -> Matcher {
    Matcher(Inner::Any)
}

/// Matches any value of the given kind.
/// # Examples
/// ```
/// # use mockingbird::{any_of, Value, ValueKind};
/// let m = any_of(ValueKind::Int);
/// assert!(m.matches(&Value::from(5)));
/// assert!(!m.matches(&Value::from("five")));
/// ```
pub fn any_of(kind: ValueKind) -> Matcher {
    Matcher(Inner::AnyOf(TypeTag::Kind(kind)))
}

/// Matches any opaque value holding a `T`.
pub fn instance_of<T: 'static>() -> Matcher {
    let tag = TypeTag::Opaque(TypeId::of::<T>(), any::type_name::<T>());
    Matcher(Inner::AnyOf(tag))
}

pub fn eq(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Eq(v.into()))
}

pub fn ne(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Ne(v.into()))
}

pub fn lt(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Lt(v.into()))
}

pub fn le(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Le(v.into()))
}

pub fn gt(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Gt(v.into()))
}

pub fn ge(v: impl Into<Value>) -> Matcher {
    Matcher(Inner::Ge(v.into()))
}

/// Matches when every operand matches.  Plain values are compared for
/// equality.
pub fn and<I, M>(operands: I) -> Matcher
    where I: IntoIterator<Item = M>,
          M: Into<Matcher>
{
    Matcher(Inner::And(operands.into_iter().map(Into::into).collect()))
}

/// Matches when any operand matches.
pub fn or<I, M>(operands: I) -> Matcher
    where I: IntoIterator<Item = M>,
          M: Into<Matcher>
{
    Matcher(Inner::Or(operands.into_iter().map(Into::into).collect()))
}

pub fn not(operand: impl Into<Matcher>) -> Matcher {
    Matcher(Inner::Not(Box::new(operand.into())))
}

/// Matches strings containing `sub`.  An empty `sub` matches nothing.
pub fn contains(sub: impl Into<String>) -> Matcher {
    Matcher(Inner::Contains(sub.into()))
}

cfg_if! {
    if #[cfg(feature = "regex")] {
        /// Matches strings in which the regular expression finds a match.
        ///
        /// Fails with an `ArgumentError` if `pattern` does not compile.
        pub fn matches(pattern: &str) -> Result<Matcher> {
            predicate::str::is_match(pattern)
                .map(|re| {
                    Matcher(Inner::Regex(pattern.to_owned(), Rc::new(re)))
                }).map_err(|e| Error::argument(format!(
                    "invalid regular expression {:?}: {}", pattern, e)))
        }
    } else {
        /// Regular expressions need the `regex` feature.  Always fails with
        /// an `ArgumentError`.
        pub fn matches(pattern: &str) -> Result<Matcher> {
            Err(Error::argument(format!(
                "cannot match {:?}: mockingbird was built without the regex \
                 feature", pattern)))
        }
    }
}

/// Matches whatever the predicate accepts.
///
/// # Examples
/// ```
/// # use mockingbird::{arg_that, Value};
/// # use predicates::prelude::*;
/// let m = arg_that(predicate::eq(Value::from(4)));
/// assert!(m.matches(&Value::from(4)));
/// ```
pub fn arg_that<P>(pred: P) -> Matcher
    where P: Predicate<Value> + 'static
{
    Matcher(Inner::ArgThat(Rc::new(pred)))
}

/// Like [`arg_that`], for a plain closure.
pub fn arg_that_fn<F>(f: F) -> Matcher
    where F: Fn(&Value) -> bool + 'static
{
    arg_that(predicate::function(f))
}

/// A new captor that accepts anything.
pub fn captor() -> Captor {
    captor_of(any())
}

/// A new captor that only accepts what `matcher` accepts.
pub fn captor_of(matcher: impl Into<Matcher>) -> Captor {
    Captor {
        inner: Rc::new(CaptorState {
            matcher: matcher.into(),
            values: RefCell::new(Vec::new())
        })
    }
}

struct CaptorState {
    matcher: Matcher,
    values: RefCell<Vec<Value>>,
}

/// A matcher that remembers the arguments it was selected for.
///
/// Clones share the same store, so keep one handle for inspection and hand a
/// clone to the pattern.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let dog = Double::new("dog");
/// let name = captor();
/// dog.when("bark", args!(name.clone())).unwrap().then_return("Wuff");
/// dog.call("bark", args!("Rex")).unwrap();
/// assert_eq!(name.value().unwrap(), Value::from("Rex"));
/// ```
#[derive(Clone)]
pub struct Captor {
    inner: Rc<CaptorState>,
}

impl Captor {
    pub fn matches(&self, value: &Value) -> bool {
        self.inner.matcher.matches(value)
    }

    fn capture(&self, value: Value) {
        self.inner.values.borrow_mut().push(value);
    }

    /// The most recently captured value.
    pub fn value(&self) -> Result<Value> {
        self.inner.values.borrow()
            .last()
            .cloned()
            .ok_or_else(|| Error::Matcher("No argument value was captured!"
                                          .to_owned()))
    }

    /// Every captured value, oldest first.
    pub fn all_values(&self) -> Vec<Value> {
        self.inner.values.borrow().clone()
    }

    /// A matcher backed by this captor.
    pub fn matcher(&self) -> Matcher {
        Matcher::from(self.clone())
    }
}

impl PartialEq for Captor {
    fn eq(&self, other: &Captor) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Captor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Captor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.matcher.0 {
            Inner::Any => f.write_str("captor()"),
            _ => write!(f, "captor_of({})", self.inner.matcher)
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn comparisons_are_native() {
        assert!(lt(5).matches(&Value::from(4)));
        assert!(!lt(5).matches(&Value::from(5)));
        assert!(le(5).matches(&Value::from(5)));
        assert!(gt(1.5).matches(&Value::from(2)));
        assert!(ge("b").matches(&Value::from("c")));
        // Incomparable values never satisfy an ordering
        assert!(!gt(1).matches(&Value::from("x")));
    }

    #[test]
    fn contains_needs_a_nonempty_substring() {
        assert!(contains("oo").matches(&Value::from("foo")));
        assert!(!contains("").matches(&Value::from("foo")));
        assert!(!contains("1").matches(&Value::from(1)));
    }

    #[test]
    fn logical_operands_default_to_equality() {
        let m = or([1, 2]);
        assert!(m.matches(&Value::from(2)));
        assert!(!m.matches(&Value::from(3)));
        assert!(not(3).matches(&Value::from(4)));
        assert!(and([gt(1), lt(5)]).matches(&Value::from(3)));
    }

    #[test]
    fn tiers() {
        assert_eq!(any().tier(), 1);
        assert_eq!(captor().matcher().tier(), 1);
        assert_eq!(any_of(ValueKind::Int).tier(), 2);
        assert_eq!(captor_of(gt(0)).matcher().tier(), 2);
        assert_eq!(eq(1).tier(), 3);
    }

    #[test]
    fn empty_captor() {
        let c = captor();
        assert_eq!(c.value().unwrap_err().kind(),
                   crate::error::ErrorKind::Matcher);
        assert!(c.all_values().is_empty());
    }

    #[test]
    fn typed_any() {
        #[derive(Debug, PartialEq)]
        struct Bone;
        let m = instance_of::<Bone>();
        assert!(m.matches(&Value::opaque(Bone)));
        assert!(!m.matches(&Value::opaque(5u8)));
        assert!(!m.matches(&Value::None));
    }

    #[cfg(feature = "regex")]
    #[test]
    fn regex() {
        let m = matches("^ba+r$").unwrap();
        assert!(m.matches(&Value::from("baaar")));
        assert!(!m.matches(&Value::from("bar!")));
        assert_eq!(matches("(").unwrap_err().kind(),
                   crate::error::ErrorKind::Argument);
    }
}
