// vim: tw=80
//! Programmable test doubles: stubs, spies and mocks with argument matchers,
//! answer chains, quantified verification and in-order verification.
//!
//! A [`Double`] stands in for some callable surface: a trait object, a module
//! of free functions, a type's static methods.  Tests tell it how to answer
//! (*stubbing*), let the code under test call it, and then ask what happened
//! (*verification*).
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Answers`](#answers)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Captors`](#captors)
//! * [`Verification`](#verification)
//! * [`In-order verification`](#in-order-verification)
//! * [`Strict doubles`](#strict-doubles)
//! * [`Scoped stubs and expectations`](#scoped-stubs-and-expectations)
//! * [`Spies`](#spies)
//! * [`Substitution`](#substitution)
//! * [`Trait doubles`](#trait-doubles)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//! ```
//! use mockingbird::*;
//!
//! let dog = Double::new("dog");
//! dog.when("bark", args!("Miau")).unwrap().then_return("Wuff");
//!
//! assert_eq!(dog.call("bark", args!("Miau")).unwrap(), Value::from("Wuff"));
//! // A lenient double answers None to anything it was not told about
//! assert_eq!(dog.call("bark", args!("Wau")).unwrap(), Value::None);
//!
//! dog.verify("bark", args!("Miau"), 1).unwrap();
//! ```
//!
//! Arguments are written with the [`args!`] macro.  Positional arguments come
//! first; keyword arguments follow a semicolon.  Anything that converts into a
//! [`Value`] may be an argument, and so may any [`Matcher`].
//!
//! ## Answers
//!
//! Every stub rule owns a chain of answers.  Each matching call consumes the
//! head of the chain, except for the last answer which is repeated forever.
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! dog.when("bark", args!(ANY_REST)).unwrap()
//!     .then_return("Wuff")
//!     .then_answer(|args| format!("{}!", args.get(0).unwrap()))
//!     .then_raise("hoarse");
//! assert_eq!(dog.call("bark", args!()).unwrap(), Value::from("Wuff"));
//! assert_eq!(dog.call("bark", args!(1)).unwrap(), Value::from("1!"));
//! assert_eq!(dog.call("bark", args!()).unwrap_err(),
//!            Error::Raised(Value::from("hoarse")));
//! assert_eq!(dog.call("bark", args!()).unwrap_err(),
//!            Error::Raised(Value::from("hoarse")));
//! ```
//!
//! Declaring a rule with the same member and argument pattern as an existing
//! rule replaces it.  When several rules match a call, the most specific one
//! answers: a rule without rest markers beats a rule with them, literals beat
//! constraining matchers, and constraining matchers beat [`any()`].  Among
//! equally specific rules the most recent one wins.
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! dog.when("bark", args!(1)).unwrap().then_return("one");
//! dog.when("bark", args!(ANY_REST)).unwrap().then_return("anything");
//! dog.when("bark", args!(any_of(ValueKind::Int))).unwrap().then_return("int");
//! assert_eq!(dog.call("bark", args!(1)).unwrap(), Value::from("one"));
//! assert_eq!(dog.call("bark", args!(2)).unwrap(), Value::from("int"));
//! assert_eq!(dog.call("bark", args!("x")).unwrap(), Value::from("anything"));
//! ```
//!
//! ## Matching arguments
//!
//! Matchers test a single argument.  Besides literal values there are
//! [`any`], [`any_of`], [`instance_of`], the comparisons [`eq`], [`ne`],
//! [`lt`], [`le`], [`gt`], [`ge`], the combinators [`and`], [`or`], [`not`],
//! the string matchers [`contains`] and [`matches`], and [`arg_that`], which
//! wraps any [`Predicate`] from the `predicates` crate.
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! dog.when("fetch", args!(and([gt(0), lt(10)]); toy = contains("ball")))
//!     .unwrap()
//!     .then_return(true);
//! assert_eq!(dog.call("fetch", args!(3; toy = "red ball")).unwrap(),
//!            Value::from(true));
//! assert_eq!(dog.call("fetch", args!(30; toy = "red ball")).unwrap(),
//!            Value::None);
//! ```
//!
//! The markers [`REST_POSITIONAL`], [`REST_KEYWORD`] and [`ANY_REST`] accept
//! trailing positional arguments, extra keyword arguments, or both.
//!
//! ## Captors
//!
//! A [`Captor`] is a matcher that remembers what it matched.  It records
//! arguments when its rule answers a call, and when a verification selects a
//! call.
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! dog.call("bark", args!("Wuff")).unwrap();
//! dog.call("bark", args!("Grr")).unwrap();
//! let sound = captor();
//! dog.verify("bark", args!(&sound), 2).unwrap();
//! assert_eq!(sound.all_values(),
//!            vec![Value::from("Wuff"), Value::from("Grr")]);
//! assert_eq!(sound.value().unwrap(), Value::from("Grr"));
//! ```
//!
//! ## Verification
//!
//! [`Double::verify`] counts the recorded calls that match a pattern and
//! compares the count with a [`VerificationMode`].  A plain number means
//! "exactly that many times".
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! dog.call("bark", args!("Wuff")).unwrap();
//! dog.call("bark", args!("Wuff")).unwrap();
//! dog.verify("bark", args!("Wuff"), VerificationMode::AtLeast(1)).unwrap();
//! dog.verify("bark", args!("Wuff"), VerificationMode::Between(1, 3)).unwrap();
//! dog.verify("sit", args!(), VerificationMode::never()).unwrap();
//!
//! let e = dog.verify("bark", args!("Miau"), 1).unwrap_err();
//! assert_eq!(e.to_string(), "Wanted but not invoked:\n\n    \
//!     bark(\"Miau\")\n\nInstead got:\n\n    bark(\"Wuff\")\n    \
//!     bark(\"Wuff\")\n");
//!
//! verify_no_more_interactions(&[&dog]).unwrap();
//! ```
//!
//! ## In-order verification
//!
//! An [`InOrder`] session records the calls to several doubles in one queue.
//! Each verification consumes calls from the front of it.
//! ```
//! # use mockingbird::*;
//! let a = Double::new("a");
//! let b = Double::new("b");
//! let in_order = InOrder::new(&[&a, &b]).unwrap();
//! a.call("x", args!()).unwrap();
//! b.call("y", args!()).unwrap();
//!
//! let e = in_order.verify(&b, "y", args!(), 1).unwrap_err();
//! assert_eq!(e.to_string(), "Wanted a call from b, but got a.x() instead!");
//! in_order.verify(&a, "x", args!(), 1).unwrap();
//! in_order.verify(&b, "y", args!(), 1).unwrap();
//! ```
//!
//! ## Strict doubles
//!
//! A strict double fails every call that no rule allows with
//! [`Error::UnexpectedInvocation`].  It may also carry a
//! [`SignatureChecker`], which rejects declarations, verifications and calls
//! whose argument shape the real member could not accept.
//! ```
//! # use mockingbird::*;
//! let sigs = Signatures::new()
//!     .member("bark", Signature::new().param("sound"));
//! let dog = Double::builder("dog")
//!     .strict(true)
//!     .strict_signatures(sigs)
//!     .build();
//! dog.when("bark", args!("Wuff")).unwrap().then_return(());
//! assert_eq!(dog.call("bark", args!("Miau")).unwrap_err().kind(),
//!            ErrorKind::UnexpectedInvocation);
//! assert_eq!(dog.when("bark", args!(1, 2)).err().unwrap().kind(),
//!            ErrorKind::Shape);
//! ```
//!
//! ## Scoped stubs and expectations
//!
//! [`Double::when_scoped`] and [`Double::expect_scoped`] return a guard.  When
//! the guard ends the rule disappears, and its usage is checked.
//! [`Double::expect`] declares a rule with a required call count; calls
//! beyond its upper bound fail immediately.
//! ```
//! # use mockingbird::*;
//! let dog = Double::new("dog");
//! let mut guard = dog.expect_scoped("bark", args!(), 2).unwrap();
//! guard.then_return("Wuff");
//! dog.call("bark", args!()).unwrap();
//! dog.call("bark", args!()).unwrap();
//! assert_eq!(dog.call("bark", args!()).unwrap_err().kind(),
//!            ErrorKind::UnexpectedInvocation);
//! guard.finish().unwrap();
//! assert!(!dog.is_stubbed());
//! ```
//!
//! ## Spies
//!
//! A spy delegates unmatched calls to an original implementation, while
//! still recording them for verification.
//! ```
//! # use mockingbird::*;
//! let dog = Double::builder("dog")
//!     .original("bark", |_| Ok(Value::from("Wuff")))
//!     .spy()
//!     .build();
//! dog.when("bark", args!("quiet")).unwrap().then_return(());
//! assert_eq!(dog.call("bark", args!()).unwrap(), Value::from("Wuff"));
//! assert_eq!(dog.call("bark", args!("quiet")).unwrap(), Value::None);
//! dog.verify("bark", args!(ANY_REST), 2).unwrap();
//! ```
//!
//! ## Substitution
//!
//! mockingbird never rewrites code.  Installing a double in place of a real
//! member is delegated to a [`Substitution`].  The bundled [`Patchboard`] is a
//! delegation table that production code can call through, and a
//! [`Registry`] keeps track of which double observes which [`Subject`].  See
//! [`Registry`] for an example.
//!
//! ## Trait doubles
//!
//! The [`#[double]`](macro@double) attribute generates a strict double for a
//! trait.  The generated struct dereferences to [`Double`], so stubbing and
//! verification work as usual.
//! ```
//! # use mockingbird::*;
//! #[double]
//! trait Kennel {
//!     fn count(&self) -> u32;
//!     fn admit(&mut self, name: &str) -> Result<(), String>;
//! }
//!
//! let mut kennel = DoubleKennel::new();
//! kennel.when("count", args!()).unwrap().then_return(2);
//! kennel.when("admit", args!("Rex")).unwrap().then_raise("full");
//! kennel.when("admit", args!("Fido")).unwrap().then_return(());
//! assert_eq!(kennel.count(), 2);
//! assert_eq!(kennel.admit("Rex"), Err("full".to_owned()));
//! assert_eq!(kennel.admit("Fido"), Ok(()));
//! ```
//!
//! ## Crate features
//!
//! * **`regex`** - Enabled by default.  Provides the [`matches`] matcher.
//!   Without it, `matches` fails with an `ArgumentError`.
//!
//! Doubles log what they do through `tracing`: declarations and
//! verifications at `debug`, matching details at `trace`.
//!
//! [`Predicate`]: predicates::Predicate

mod answer;
mod double;
mod error;
mod inorder;
mod invocation;
mod ledger;
mod matcher;
mod matching;
mod pattern;
mod registry;
mod settings;
mod signature;
mod substitution;
mod value;
mod verification;

pub use mockingbird_derive::double;

pub use crate::{
    answer::{Answer, AnswerChain, AnswerFn},
    double::{Double, DoubleBuilder, ScopedStub, Stubbing},
    error::{Error, ErrorKind, Result},
    inorder::InOrder,
    invocation::{ActualInvocation, DeclaredInvocation},
    matcher::{
        and,
        any,
        any_of,
        arg_that,
        arg_that_fn,
        captor,
        captor_of,
        contains,
        eq,
        ge,
        gt,
        instance_of,
        le,
        lt,
        matches,
        ne,
        not,
        or,
        Captor,
        Matcher
    },
    pattern::{
        Args,
        ArgumentPattern,
        CallArgs,
        IntoSlot,
        Slot,
        ANY_REST,
        REST_KEYWORD,
        REST_POSITIONAL
    },
    registry::Registry,
    settings::{Settings, CHECK_USAGE_VAR, STRICT_VAR},
    signature::{CallShape, Signature, SignatureChecker, Signatures},
    substitution::{
        InstallHandle,
        MemberKind,
        Original,
        Patchboard,
        Replacement,
        Subject,
        Substitution
    },
    value::{FromValue, OpaqueValue, Value, ValueKind},
    verification::{
        verify_no_more_interactions,
        verify_zero_interactions,
        VerificationMode,
        VerifyOptions,
        Wanted
    }
};

/// Build an [`Args`] list.
///
/// Positional arguments are separated by commas.  Keyword arguments follow a
/// semicolon, written as `key = value`.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let a = args!(1, "two"; three = 3.0);
/// let b = Args::new().arg(1).arg("two").kwarg("three", 3.0);
/// assert_eq!(a, b);
/// assert_eq!(args!(; verbose = true), Args::new().kwarg("verbose", true));
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    ($($p:expr),* ; $($k:ident = $v:expr),+ $(,)?) => {
        $crate::Args::new()
            $(.arg($p))*
            $(.kwarg(stringify!($k), $v))*
    };
    ($($p:expr),+ $(,)?) => {
        $crate::Args::new() $(.arg($p))*
    };
}

/// Glue between generated trait doubles and the untyped dispatch.
#[doc(hidden)]
pub mod __private {
    use crate::{Error, FromValue, Result, Value};

    fn fail(e: Error) -> ! {
        panic!("{}", e)
    }

    pub fn into_unit(r: Result<Value>) {
        if let Err(e) = r {
            fail(e);
        }
    }

    pub fn into_return<R: FromValue>(r: Result<Value>) -> R {
        match r.and_then(R::from_value) {
            Ok(r) => r,
            Err(e) => fail(e)
        }
    }

    /// A raised value becomes the `Err` variant.
    pub fn into_result<T, E>(r: Result<Value>) -> std::result::Result<T, E>
        where T: FromValue,
              E: FromValue
    {
        match r {
            Ok(v) => T::from_value(v).map(Ok).unwrap_or_else(|e| fail(e)),
            Err(Error::Raised(v)) => E::from_value(v).map(Err)
                .unwrap_or_else(|e| fail(e)),
            Err(e) => fail(e)
        }
    }
}
