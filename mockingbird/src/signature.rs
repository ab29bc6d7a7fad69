// vim: tw=80
//! Optional checking of call shapes against a real signature.
//!
//! A double configured with a [`SignatureChecker`] asks it about every
//! declaration, verification and call before touching any state.  A rejected
//! shape is reported as a [`ShapeError`](crate::ErrorKind::Shape).
use std::collections::BTreeMap;

/// The shape of an argument list: how many positional arguments, which
/// keywords, and whether more of either may follow.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallShape {
    pub positional: usize,
    /// Keyword names, sorted.
    pub keywords: Vec<String>,
    /// A rest marker may stand for more positional arguments.
    pub open_positional: bool,
    /// A rest marker may stand for more keyword arguments.
    pub open_keyword: bool,
}

/// Validates call shapes for the members of one subject.
pub trait SignatureChecker {
    fn check_shape(&self, name: &str, shape: &CallShape)
        -> std::result::Result<(), String>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Param {
    name: String,
    has_default: bool,
}

/// A callable's parameter list.
///
/// # Examples
/// ```
/// # use mockingbird::{CallShape, Signature};
/// let sig = Signature::new().param("sound").param_with_default("volume");
/// let shape = CallShape{positional: 1, ..Default::default()};
/// assert!(sig.check("bark", &shape).is_ok());
/// let shape = CallShape{positional: 3, ..Default::default()};
/// assert_eq!(sig.check("bark", &shape).unwrap_err(),
///     "bark() takes 2 positional arguments but 3 were given");
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    var_positional: bool,
    var_keyword: bool,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param{name: name.into(), has_default: false});
        self
    }

    /// Add a parameter with a default value.
    pub fn param_with_default(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param{name: name.into(), has_default: true});
        self
    }

    /// Accept any number of extra positional arguments.
    pub fn var_positional(mut self) -> Self {
        self.var_positional = true;
        self
    }

    /// Accept any extra keyword arguments.
    pub fn var_keyword(mut self) -> Self {
        self.var_keyword = true;
        self
    }

    /// Could a call of this shape bind to this signature?
    pub fn check(&self, name: &str, shape: &CallShape)
        -> std::result::Result<(), String>
    {
        let nparams = self.params.len();
        if shape.positional > nparams && !self.var_positional {
            return Err(format!(
                "{}() takes {} positional arguments but {} were given",
                name, nparams, shape.positional));
        }
        let mut bound = vec![false; nparams];
        for b in bound.iter_mut().take(shape.positional) {
            *b = true;
        }
        for key in shape.keywords.iter() {
            match self.params.iter().position(|p| &p.name == key) {
                Some(i) if bound[i] => {
                    return Err(format!(
                        "{}() got multiple values for argument '{}'",
                        name, key));
                },
                Some(i) => bound[i] = true,
                None if self.var_keyword => (),
                None => {
                    return Err(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        name, key));
                }
            }
        }
        if shape.open_positional || shape.open_keyword {
            // The rest markers may supply whatever is missing
            return Ok(());
        }
        let missing = self.params.iter()
            .zip(bound.iter())
            .find(|(p, b)| !**b && !p.has_default);
        match missing {
            Some((p, _)) => Err(format!(
                "{}() missing a required argument: '{}'", name, p.name)),
            None => Ok(())
        }
    }
}

/// The bundled [`SignatureChecker`]: a signature per member name.  Members
/// without a signature are rejected.
#[derive(Clone, Debug, Default)]
pub struct Signatures {
    members: BTreeMap<String, Signature>,
}

impl Signatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, name: impl Into<String>, sig: Signature) -> Self {
        self.members.insert(name.into(), sig);
        self
    }
}

impl SignatureChecker for Signatures {
    fn check_shape(&self, name: &str, shape: &CallShape)
        -> std::result::Result<(), String>
    {
        match self.members.get(name) {
            Some(sig) => sig.check(name, shape),
            None => Err(format!("unknown member '{}'", name))
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    fn shape(positional: usize, keywords: &[&str]) -> CallShape {
        CallShape {
            positional,
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
            .. Default::default()
        }
    }

    #[test]
    fn keywords_bind_by_name() {
        let sig = Signature::new().param("a").param("b");
        assert!(sig.check("f", &shape(1, &["b"])).is_ok());
        assert_eq!(sig.check("f", &shape(1, &["a"])).unwrap_err(),
                   "f() got multiple values for argument 'a'");
        assert_eq!(sig.check("f", &shape(2, &["c"])).unwrap_err(),
                   "f() got an unexpected keyword argument 'c'");
    }

    #[test]
    fn missing_required() {
        let sig = Signature::new().param("a").param_with_default("b");
        assert!(sig.check("f", &shape(1, &[])).is_ok());
        assert_eq!(sig.check("f", &shape(0, &[])).unwrap_err(),
                   "f() missing a required argument: 'a'");
        let open = CallShape{open_positional: true, ..shape(0, &[])};
        assert!(sig.check("f", &open).is_ok());
    }

    #[test]
    fn var_args() {
        let sig = Signature::new().param("a").var_positional().var_keyword();
        assert!(sig.check("f", &shape(5, &["x", "y"])).is_ok());
    }

    #[test]
    fn unknown_member() {
        let sigs = Signatures::new().member("bark", Signature::new());
        assert!(sigs.check_shape("bark", &shape(0, &[])).is_ok());
        assert_eq!(sigs.check_shape("meow", &shape(0, &[])).unwrap_err(),
                   "unknown member 'meow'");
    }
}
