// vim: tw=80
//! Verifying the order of calls across several doubles.
//!
//! An [`InOrder`] session observes a set of doubles.  Every call to any of
//! them is appended to one shared queue, and each in-order verification
//! consumes a run of calls from the front of that queue.
use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{
    double::{Double, WeakDouble},
    error::{Error, Result},
    invocation::ActualInvocation,
    matching::rule_matches,
    pattern::{Args, ArgumentPattern},
    verification::{VerificationMode, VerifyOptions, Wanted}
};

pub(crate) struct Session {
    queue: Vec<Rc<ActualInvocation>>,
    /// Index of the first unconsumed entry.
    cursor: usize,
    closed: bool,
    doubles: Vec<WeakDouble>,
}

impl Session {
    pub(crate) fn record(&mut self, actual: Rc<ActualInvocation>) {
        if !self.closed {
            self.queue.push(actual);
        }
    }
}

/// An in-order verification session.
///
/// The session ends when it is [closed](InOrder::close) or dropped.  After
/// that it records nothing more, but entries already queued can still be
/// inspected and verified.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let a = Double::new("a");
/// let b = Double::new("b");
/// let in_order = InOrder::new(&[&a, &b]).unwrap();
/// a.call("x", args!()).unwrap();
/// b.call("y", args!()).unwrap();
/// a.call("x", args!()).unwrap();
///
/// in_order.verify(&a, "x", args!(), 1).unwrap();
/// in_order.verify(&b, "y", args!(), 1).unwrap();
/// in_order.verify(&a, "x", args!(), 1).unwrap();
/// ```
pub struct InOrder {
    session: Rc<RefCell<Session>>,
}

impl InOrder {
    /// Start observing `doubles`.  Naming a double twice is an
    /// `ArgumentError`.
    pub fn new(doubles: &[&Double]) -> Result<Self> {
        for (i, d) in doubles.iter().enumerate() {
            if doubles[..i].iter().any(|other| other.ptr_eq(d)) {
                return Err(Error::argument(format!(
                    "{} is provided more than once", d)));
            }
        }
        let session = Rc::new(RefCell::new(Session {
            queue: Vec::new(),
            cursor: 0,
            closed: false,
            doubles: doubles.iter().map(|d| d.downgrade()).collect()
        }));
        for d in doubles {
            d.attach(Rc::downgrade(&session));
        }
        debug!(doubles = doubles.len(), "in-order session started");
        Ok(InOrder{session})
    }

    fn observes(&self, double: &Double) -> bool {
        self.session.borrow().doubles.iter()
            .filter_map(WeakDouble::upgrade)
            .any(|d| d.ptr_eq(double))
    }

    /// Verify that the next calls in the queue are `mode` calls to
    /// `double.name` matching `args`.
    ///
    /// When the mode's lower bound is zero and the next call is something
    /// else, the verification passes and consumes nothing.  A failed
    /// verification consumes nothing either.
    pub fn verify(&self, double: &Double, name: &str, args: Args,
                  mode: impl Into<VerificationMode>) -> Result<()>
    {
        let mode = mode.into().validate()?;
        if !self.observes(double) {
            return Err(Error::argument(format!(
                "{} is not part of that InOrder.", double)));
        }
        let pattern = ArgumentPattern::new(args)?;
        double.check_shape(name, &pattern.shape())?;
        let wanted = pattern.render(name);
        let optional = mode.lower_bound() == 0;
        let (start, pending, recorded) = {
            let session = self.session.borrow();
            (session.cursor, session.queue[session.cursor..].to_vec(),
             !session.queue.is_empty())
        };

        let head = match pending.first() {
            Some(head) => head.clone(),
            None if optional => return Ok(()),
            None if !recorded => {
                return Err(Error::verification_msg(wanted,
                    "There are no recorded invocations."));
            },
            None => {
                return Err(Error::verification_msg(wanted,
                    "There are no more recorded invocations."));
            }
        };
        if head.double_id() != double.id() {
            if optional {
                return Ok(());
            }
            let got = head.render_qualified();
            let message = format!("Wanted a call from {}, but got {} instead!",
                                  double, got);
            return Err(Error::verification(wanted, vec![got], message));
        }
        // Matchers run unborrowed; the calls they make are queued behind us.
        let matches = |a: &Rc<ActualInvocation>| {
            a.double_id() == head.double_id() && a.name() == name &&
                rule_matches(&pattern, a.args())
        };
        if !matches(&head) {
            if optional {
                return Ok(());
            }
            let got = head.render();
            let message = format!("Wanted {} to be invoked, got {} instead.",
                                  wanted, got);
            return Err(Error::verification(wanted, vec![got], message));
        }

        let run = pending.iter()
            .take_while(|a| matches(*a))
            .count();
        let found = pending[..run].iter().map(|a| a.render()).collect();
        mode.verify(&Wanted::new(wanted.clone(), Vec::new()).with_found(found),
                    run)?;
        for a in pending[..run].iter() {
            a.mark_verified_in_order();
            pattern.capture(a.args());
        }
        self.session.borrow_mut().cursor = start + run;
        debug!(wanted = %wanted, %mode, run, "verified in order");
        Ok(())
    }

    /// Like [`verify`](InOrder::verify), with options given as signed counts.
    pub fn verify_with(&self, double: &Double, name: &str, args: Args,
                       opts: VerifyOptions) -> Result<()>
    {
        let mode = opts.mode()?;
        self.verify(double, name, args, mode)
    }

    /// Every call the session recorded.
    pub fn queued(&self) -> Vec<Rc<ActualInvocation>> {
        self.session.borrow().queue.clone()
    }

    /// Calls not yet consumed by a verification.
    pub fn remaining(&self) -> Vec<Rc<ActualInvocation>> {
        let session = self.session.borrow();
        session.queue[session.cursor..].to_vec()
    }

    pub fn is_closed(&self) -> bool {
        self.session.borrow().closed
    }

    /// Stop observing.  Closing twice does nothing.
    pub fn close(&self) {
        let doubles = {
            let mut session = self.session.borrow_mut();
            if session.closed {
                return;
            }
            session.closed = true;
            session.doubles.clone()
        };
        let weak = Rc::downgrade(&self.session);
        for d in doubles.iter().filter_map(WeakDouble::upgrade) {
            d.detach(&weak);
        }
        debug!("in-order session closed");
    }
}

impl Drop for InOrder {
    fn drop(&mut self) {
        self.close();
    }
}
