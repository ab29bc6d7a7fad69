// vim: tw=80
//! The boundary to whatever physically routes calls into a double.
//!
//! mockingbird never patches anything itself.  A [`Substitution`] is told to
//! install a [`Replacement`] for one member of a subject, and to restore the
//! member later.  After `install`, calls to the member must reach the
//! replacement; how that happens is the substitution's business.
//!
//! [`Patchboard`] is a ready-made substitution: an explicit delegation table
//! that production code calls through.
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::Rc
};

use tracing::debug;

use crate::{
    double::WeakDouble,
    error::{Error, Result},
    pattern::CallArgs,
    value::Value
};

/// An original implementation of a member.
pub type Original = Rc<dyn Fn(&CallArgs) -> Result<Value>>;

/// How a member is reached on its subject.  Resolved once, when the member is
/// first installed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MemberKind {
    /// A free function.
    #[default]
    Function,
    /// A method bound to an instance.
    BoundMethod,
    /// A function namespaced in a type.
    Static,
    /// A method bound to the type itself.
    ClassBound,
    /// A value read without arguments.
    Property,
}

/// What a double stands in for.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Subject {
    Named(String),
    /// Identified by address.  Only meaningful while the object lives.
    Address(usize),
}

impl Subject {
    pub fn named(name: impl Into<String>) -> Self {
        Subject::Named(name.into())
    }

    /// Identify an object by its address.
    pub fn of<T: ?Sized>(t: &T) -> Self {
        Subject::Address(t as *const T as *const () as usize)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Named(n) => f.write_str(n),
            Subject::Address(a) => write!(f, "<subject at {:#x}>", a),
        }
    }
}

/// A callable that routes into a double's dispatch.
///
/// It holds the double weakly: once the double is gone, calls fail with an
/// `AnswerError`.
#[derive(Clone)]
pub struct Replacement {
    double: WeakDouble,
    name: String,
}

impl Replacement {
    pub(crate) fn new(double: WeakDouble, name: &str) -> Self {
        Replacement{double, name: name.to_owned()}
    }

    /// The member this replacement stands in for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: CallArgs) -> Result<Value> {
        match self.double.upgrade() {
            Some(d) => d.call_args(&self.name, args),
            None => Err(Error::Answer(format!(
                "the double behind {} no longer exists", self.name)))
        }
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacement")
            .field("name", &self.name)
            .finish()
    }
}

/// Identifies one installation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstallHandle {
    pub subject: Subject,
    pub name: String,
    pub kind: MemberKind,
}

/// Installs and restores replacements.
pub trait Substitution {
    /// Route calls to `subject.name` into `replacement`.
    fn install(&self, subject: &Subject, name: &str, kind: MemberKind,
               replacement: Replacement) -> Result<InstallHandle>;

    /// Undo an installation.  Restoring twice is not an error.
    fn restore(&self, handle: &InstallHandle) -> Result<()>;

    /// The implementation that `install` displaced, if known.
    fn original(&self, _handle: &InstallHandle) -> Option<Original> {
        None
    }
}

impl<S: Substitution + ?Sized> Substitution for Rc<S> {
    fn install(&self, subject: &Subject, name: &str, kind: MemberKind,
               replacement: Replacement) -> Result<InstallHandle>
    {
        (**self).install(subject, name, kind, replacement)
    }

    fn restore(&self, handle: &InstallHandle) -> Result<()> {
        (**self).restore(handle)
    }

    fn original(&self, handle: &InstallHandle) -> Option<Original> {
        (**self).original(handle)
    }
}

#[derive(Default)]
struct Route {
    original: Option<Original>,
    replacement: Option<Replacement>,
    kind: MemberKind,
}

type Routes = BTreeMap<(Subject, String), Route>;

/// A delegation table: production code calls members through the board, and
/// the board sends each call to the original or to an installed double.
///
/// Clones share the same table.
///
/// # Examples
/// ```
/// # use std::rc::Rc;
/// # use mockingbird::*;
/// let board = Patchboard::new();
/// let os = Subject::named("os.path");
/// board.define(&os, "exists", |_| Ok(Value::from(false)));
///
/// let double = Double::builder("os.path")
///     .target(board.clone(), os.clone())
///     .build();
/// double.when("exists", args!("/tmp")).unwrap().then_return(true);
/// assert_eq!(board.invoke(&os, "exists", args!("/tmp")).unwrap(),
///            Value::from(true));
///
/// double.unstub().unwrap();
/// assert_eq!(board.invoke(&os, "exists", args!("/tmp")).unwrap(),
///            Value::from(false));
/// ```
#[derive(Clone, Default)]
pub struct Patchboard {
    routes: Rc<RefCell<Routes>>,
}

impl Patchboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the original implementation of a member.
    pub fn define<F>(&self, subject: &Subject, name: &str, f: F)
        where F: Fn(&CallArgs) -> Result<Value> + 'static
    {
        let mut routes = self.routes.borrow_mut();
        let route = routes.entry((subject.clone(), name.to_owned()))
            .or_default();
        route.original = Some(Rc::new(f));
    }

    /// Call a member.
    pub fn invoke(&self, subject: &Subject, name: &str,
                  args: crate::pattern::Args) -> Result<Value>
    {
        self.invoke_args(subject, name, CallArgs::new(args)?)
    }

    /// Read a property.
    pub fn get(&self, subject: &Subject, name: &str) -> Result<Value> {
        self.invoke_args(subject, name, CallArgs::default())
    }

    pub fn invoke_args(&self, subject: &Subject, name: &str, args: CallArgs)
        -> Result<Value>
    {
        // Release the table before calling out; the callee may patch.
        let (replacement, original) = {
            let routes = self.routes.borrow();
            match routes.get(&(subject.clone(), name.to_owned())) {
                Some(r) => (r.replacement.clone(), r.original.clone()),
                None => (None, None)
            }
        };
        match (replacement, original) {
            (Some(r), _) => r.call(args),
            (None, Some(o)) => o(&args),
            (None, None) => Err(Error::argument(format!(
                "{} has no member '{}'", subject, name)))
        }
    }

    /// Is a replacement installed for the member?
    pub fn is_patched(&self, subject: &Subject, name: &str) -> bool {
        self.routes.borrow()
            .get(&(subject.clone(), name.to_owned()))
            .map(|r| r.replacement.is_some())
            .unwrap_or(false)
    }

    /// The kind the member was last installed as.
    pub fn kind(&self, subject: &Subject, name: &str) -> Option<MemberKind> {
        self.routes.borrow()
            .get(&(subject.clone(), name.to_owned()))
            .filter(|r| r.replacement.is_some())
            .map(|r| r.kind)
    }
}

impl Substitution for Patchboard {
    fn install(&self, subject: &Subject, name: &str, kind: MemberKind,
               replacement: Replacement) -> Result<InstallHandle>
    {
        let mut routes = self.routes.borrow_mut();
        let route = routes.entry((subject.clone(), name.to_owned()))
            .or_default();
        route.replacement = Some(replacement);
        route.kind = kind;
        debug!(%subject, name, ?kind, "installed");
        Ok(InstallHandle{subject: subject.clone(), name: name.to_owned(), kind})
    }

    fn restore(&self, handle: &InstallHandle) -> Result<()> {
        let mut routes = self.routes.borrow_mut();
        let key = (handle.subject.clone(), handle.name.clone());
        let orphan = match routes.get_mut(&key) {
            Some(route) => {
                route.replacement = None;
                route.original.is_none()
            },
            None => false
        };
        if orphan {
            routes.remove(&key);
        }
        debug!(subject = %handle.subject, name = %handle.name, "restored");
        Ok(())
    }

    fn original(&self, handle: &InstallHandle) -> Option<Original> {
        self.routes.borrow()
            .get(&(handle.subject.clone(), handle.name.clone()))
            .and_then(|r| r.original.clone())
    }
}

impl fmt::Debug for Patchboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.borrow();
        f.debug_list()
            .entries(routes.keys().map(|(s, n)| format!("{}.{}", s, n)))
            .finish()
    }
}
