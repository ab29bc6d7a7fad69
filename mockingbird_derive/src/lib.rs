// vim: tw=80
//! Proc macros for use with mockingbird
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the [`mockingbird`](../mockingbird/index.html) crate.

extern crate proc_macro;

mod double_trait;
use crate::double_trait::do_double;

/// Generate a strict test double for a trait.
///
/// For a trait `Foo` this emits a struct `DoubleFoo` that implements `Foo` by
/// routing every method call into a `mockingbird::Double`.  The struct
/// dereferences to that double, so stub and verify it like any other.
///
/// Methods must take a receiver and must not be generic or `async`.  Their
/// arguments must convert into a `mockingbird::Value` (reference arguments
/// are converted from an owned copy) and their return type must implement
/// `mockingbird::FromValue`.  For a method returning `Result<T, E>`, an answer
/// raised with `then_raise` becomes the `Err` variant.  Any other failure of
/// the double panics.
#[proc_macro_attribute]
pub fn double(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: proc_macro2::TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_double(attrs.into(), input));
    output.into()
}
