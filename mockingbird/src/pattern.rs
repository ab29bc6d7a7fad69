// vim: tw=80
//! Argument lists, both declared and actual.
//!
//! An [`ArgumentPattern`] is what a stub or a verification expects; a
//! [`CallArgs`] is what a call actually passed.  Both are built from an
//! [`Args`] list, usually with the [`args!`](crate::args) macro.
use std::{collections::BTreeMap, fmt};

use crate::{
    error::{Error, Result},
    matcher::{Captor, Matcher},
    signature::CallShape,
    value::Value
};

/// One entry of an argument list.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Value(Value),
    Matcher(Matcher),
    /// Zero or more trailing positional arguments.
    RestPositional,
    /// Zero or more additional keyword arguments.
    RestKeyword,
    /// Any trailing positional and keyword arguments.  Must come last.
    AnyRest,
}

/// Matches any trailing positional and keyword arguments.
pub const ANY_REST: Slot = Slot::AnyRest;
/// Matches zero or more trailing positional arguments, like `*args`.
pub const REST_POSITIONAL: Slot = Slot::RestPositional;
/// Matches zero or more additional keyword arguments, like `**kwargs`.  Write
/// it as the last positional entry.
pub const REST_KEYWORD: Slot = Slot::RestKeyword;

impl Slot {
    fn is_marker(&self) -> bool {
        matches!(self, Slot::RestPositional | Slot::RestKeyword | Slot::AnyRest)
    }

    /// Does an actual argument satisfy this (non-marker) slot?
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        match self {
            Slot::Value(v) => v == value,
            Slot::Matcher(m) => m.matches(value),
            _ => false
        }
    }

    /// Specificity of this slot: literal 3, constraining matcher 2, bare any
    /// 1.
    pub(crate) fn tier(&self) -> u8 {
        match self {
            Slot::Value(_) => 3,
            Slot::Matcher(m) => m.tier(),
            _ => 0
        }
    }

    fn capture(&self, value: &Value) {
        if let Slot::Matcher(m) = self {
            m.capture(value);
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Value(v) => write!(f, "{}", v),
            Slot::Matcher(m) => write!(f, "{}", m),
            Slot::RestPositional => f.write_str("*args"),
            Slot::RestKeyword => f.write_str("**kwargs"),
            Slot::AnyRest => f.write_str("..."),
        }
    }
}

/// Anything that can be written as an argument.
///
/// Implemented for the types that convert into a [`Value`], for matchers and
/// captors, and for the rest markers.
pub trait IntoSlot {
    fn into_slot(self) -> Slot;
}

macro_rules! into_slot_value {
    ($($t:ty)*) => {
        $(
            impl IntoSlot for $t {
                fn into_slot(self) -> Slot {
                    Slot::Value(Value::from(self))
                }
            }
        )*
    }
}
into_slot_value!{i8 i16 i32 i64 isize u8 u16 u32 u64 usize bool f32 f64 char}
into_slot_value!{&str String &String}
into_slot_value!{()}

impl IntoSlot for Value {
    fn into_slot(self) -> Slot {
        Slot::Value(self)
    }
}

impl<T: Into<Value>> IntoSlot for Option<T> {
    fn into_slot(self) -> Slot {
        Slot::Value(Value::from(self))
    }
}

impl<T: Into<Value>> IntoSlot for Vec<T> {
    fn into_slot(self) -> Slot {
        Slot::Value(Value::from(self))
    }
}

impl<T: Into<Value>> IntoSlot for BTreeMap<String, T> {
    fn into_slot(self) -> Slot {
        Slot::Value(Value::from(self))
    }
}

impl IntoSlot for Matcher {
    fn into_slot(self) -> Slot {
        Slot::Matcher(self)
    }
}

impl IntoSlot for Captor {
    fn into_slot(self) -> Slot {
        Slot::Matcher(self.matcher())
    }
}

impl IntoSlot for &Captor {
    fn into_slot(self) -> Slot {
        Slot::Matcher(self.matcher())
    }
}

impl IntoSlot for Slot {
    fn into_slot(self) -> Slot {
        self
    }
}

/// An unvalidated argument list.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let a = Args::new().arg(1).arg(any()).kwarg("loud", true);
/// assert_eq!(a, args!(1, any(); loud = true));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Slot>,
    keyword: Vec<(String, Slot)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, slot: impl IntoSlot) -> Self {
        self.positional.push(slot.into_slot());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, slot: impl IntoSlot)
        -> Self
    {
        self.keyword.push((key.into(), slot.into_slot()));
        self
    }
}

fn collect_keywords<T, F>(keyword: Vec<(String, Slot)>, mut f: F)
    -> Result<BTreeMap<String, T>>
    where F: FnMut(&str, Slot) -> Result<T>
{
    let mut map = BTreeMap::new();
    for (key, slot) in keyword {
        if map.contains_key(&key) {
            return Err(Error::argument(format!(
                "keyword argument {} given more than once", key)));
        }
        let t = f(&key, slot)?;
        map.insert(key, t);
    }
    Ok(map)
}

/// The arguments a stub or verification expects.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentPattern {
    /// Positional slots.  A trailing `RestPositional` or `AnyRest` marker is
    /// kept in place.
    positional: Vec<Slot>,
    keyword: BTreeMap<String, Slot>,
    rest_keyword: bool,
}

impl ArgumentPattern {
    /// Validate a declared argument list.
    pub fn new(args: Args) -> Result<Self> {
        let Args{mut positional, keyword} = args;
        let mut rest_keyword = false;
        if positional.last() == Some(&Slot::RestKeyword) {
            positional.pop();
            rest_keyword = true;
        }
        let n = positional.len();
        for (i, slot) in positional.iter().enumerate() {
            let last = i + 1 == n;
            match slot {
                Slot::AnyRest if !last || rest_keyword => {
                    return Err(Error::argument(
                        "ANY_REST must be the last argument"));
                },
                Slot::AnyRest if !keyword.is_empty() => {
                    return Err(Error::argument(
                        "ANY_REST cannot be combined with keyword arguments"));
                },
                Slot::RestPositional if !last => {
                    return Err(Error::argument(
                        "REST_POSITIONAL may only be followed by REST_KEYWORD"
                    ));
                },
                Slot::RestKeyword => {
                    return Err(Error::argument(
                        "REST_KEYWORD must be the last positional argument"));
                },
                _ => ()
            }
        }
        let keyword = collect_keywords(keyword, |key, slot| {
            if slot.is_marker() {
                Err(Error::argument(format!(
                    "{} cannot be the value of keyword argument {}",
                    slot, key)))
            } else {
                Ok(slot)
            }
        })?;
        Ok(ArgumentPattern{positional, keyword, rest_keyword})
    }

    /// A pattern that matches exactly the given call.
    pub fn literal(call: &CallArgs) -> Self {
        ArgumentPattern {
            positional: call.positional.iter().cloned().map(Slot::Value)
                .collect(),
            keyword: call.keyword.iter()
                .map(|(k, v)| (k.clone(), Slot::Value(v.clone())))
                .collect(),
            rest_keyword: false
        }
    }

    /// The pattern of a member called with no arguments, e.g. a property.
    pub fn empty() -> Self {
        ArgumentPattern {
            positional: Vec::new(),
            keyword: BTreeMap::new(),
            rest_keyword: false
        }
    }

    pub fn positional(&self) -> &[Slot] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Slot> {
        &self.keyword
    }

    /// Does this pattern accept additional keyword arguments?
    pub fn rest_keyword(&self) -> bool {
        self.rest_keyword
    }

    /// Does the pattern contain any rest marker?
    pub fn is_open(&self) -> bool {
        self.rest_keyword || self.positional.iter().any(Slot::is_marker)
    }

    /// Does the pattern accept only the empty argument list?
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty() &&
            !self.rest_keyword
    }

    pub fn shape(&self) -> CallShape {
        let any_rest = self.positional.last() == Some(&Slot::AnyRest);
        CallShape {
            positional: self.positional.iter().filter(|s| !s.is_marker())
                .count(),
            keywords: self.keyword.keys().cloned().collect(),
            open_positional: self.positional.last()
                .map(Slot::is_marker)
                .unwrap_or(false),
            open_keyword: self.rest_keyword || any_rest
        }
    }

    /// Feed the arguments of a selected call to any captors in the pattern.
    pub(crate) fn capture(&self, call: &CallArgs) {
        for (slot, value) in self.positional.iter().zip(call.positional.iter())
        {
            if slot.is_marker() {
                break;
            }
            slot.capture(value);
        }
        for (key, slot) in self.keyword.iter() {
            if let Some(value) = call.keyword.get(key) {
                slot.capture(value);
            }
        }
    }

    /// Render as `name(p0, p1, key=v)`.
    pub fn render(&self, name: &str) -> String {
        let mut parts = self.positional.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        parts.extend(self.keyword.iter().map(|(k, v)| format!("{}={}", k, v)));
        if self.rest_keyword {
            parts.push(Slot::RestKeyword.to_string());
        }
        format!("{}({})", name, parts.join(", "))
    }
}

/// The concrete arguments of one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Validate an actual argument list.  Matchers and markers are not
    /// allowed.
    pub fn new(args: Args) -> Result<Self> {
        fn concrete(slot: Slot) -> Result<Value> {
            match slot {
                Slot::Value(v) => Ok(v),
                other => Err(Error::argument(format!(
                    "{} is not allowed in an actual call", other)))
            }
        }
        let positional = args.positional.into_iter()
            .map(concrete)
            .collect::<Result<Vec<_>>>()?;
        let keyword = collect_keywords(args.keyword, |_, s| concrete(s))?;
        Ok(CallArgs{positional, keyword})
    }

    pub fn from_positional(positional: Vec<Value>) -> Self {
        CallArgs{positional, keyword: BTreeMap::new()}
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// The `i`th positional argument.
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.positional.get(i)
    }

    /// The keyword argument named `key`.
    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.keyword.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    pub fn shape(&self) -> CallShape {
        CallShape {
            positional: self.positional.len(),
            keywords: self.keyword.keys().cloned().collect(),
            open_positional: false,
            open_keyword: false
        }
    }

    /// Render as `name(p0, p1, key=v)`.
    pub fn render(&self, name: &str) -> String {
        let mut parts = self.positional.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        parts.extend(self.keyword.iter().map(|(k, v)| format!("{}={}", k, v)));
        format!("{}({})", name, parts.join(", "))
    }
}
