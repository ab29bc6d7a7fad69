// vim: tw=80
//! The test double itself: the dispatch entry point plus the stubbing and
//! verification surface.
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    ops::{Deref, DerefMut},
    rc::{Rc, Weak},
    sync::atomic::{AtomicUsize, Ordering},
    thread
};

use tracing::debug;

use crate::{
    answer::{no_original, Answer},
    error::{Error, Result},
    inorder::Session,
    invocation::{ActualInvocation, DeclaredInvocation},
    ledger::Ledger,
    matching::{find_matches, patterns_overlap, rule_matches, select_winner},
    pattern::{Args, ArgumentPattern, CallArgs},
    settings::Settings,
    signature::{CallShape, SignatureChecker},
    substitution::{
        InstallHandle,
        MemberKind,
        Original,
        Replacement,
        Subject,
        Substitution
    },
    value::Value,
    verification::{VerificationMode, VerifyOptions, Wanted}
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

struct Target {
    substitution: Rc<dyn Substitution>,
    subject: Subject,
}

pub(crate) struct DoubleState {
    id: usize,
    name: String,
    settings: Settings,
    ledger: Ledger,
    checker: Option<Rc<dyn SignatureChecker>>,
    originals: BTreeMap<String, Original>,
    spy: bool,
    kinds: BTreeMap<String, MemberKind>,
    target: Option<Target>,
    installs: BTreeMap<String, InstallHandle>,
    sessions: Vec<Weak<RefCell<Session>>>,
}

impl DoubleState {
    fn kind(&self, name: &str) -> MemberKind {
        self.kinds.get(name).copied().unwrap_or_default()
    }

    /// Calls worth citing when `name` was never invoked: the calls to `name`,
    /// or every call if there are none.
    fn seen(&self, name: &str) -> Vec<String> {
        let same = self.ledger.all_actuals(name);
        let calls = if same.is_empty() {
            self.ledger.actuals().to_vec()
        } else {
            same
        };
        calls.iter().map(|a| a.render()).collect()
    }

    fn check_shape(&self, name: &str, shape: &CallShape) -> Result<()> {
        match &self.checker {
            Some(c) => c.check_shape(name, shape).map_err(Error::Shape),
            None => Ok(())
        }
    }
}

impl Drop for DoubleState {
    fn drop(&mut self) {
        if let Some(target) = &self.target {
            for handle in self.installs.values() {
                // Nobody is left to report to
                let _ = target.substitution.restore(handle);
            }
        }
    }
}

/// Weak reference to a double, held by replacements and sessions.
#[derive(Clone)]
pub(crate) struct WeakDouble(Weak<RefCell<DoubleState>>);

impl WeakDouble {
    pub fn upgrade(&self) -> Option<Double> {
        self.0.upgrade().map(Double)
    }
}

/// Configures a new [`Double`].
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let dog = Double::builder("dog")
///     .strict(true)
///     .member("age", MemberKind::Property)
///     .build();
/// dog.when("age", args!()).unwrap().then_return(3);
/// assert_eq!(dog.get("age").unwrap(), Value::from(3));
/// ```
pub struct DoubleBuilder {
    name: String,
    settings: Settings,
    checker: Option<Rc<dyn SignatureChecker>>,
    originals: BTreeMap<String, Original>,
    spy: bool,
    kinds: BTreeMap<String, MemberKind>,
    target: Option<Target>,
}

impl DoubleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        DoubleBuilder {
            name: name.into(),
            settings: Settings::default(),
            checker: None,
            originals: BTreeMap::new(),
            spy: false,
            kinds: BTreeMap::new(),
            target: None
        }
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Fail unmatched calls with `UnexpectedInvocation`.
    pub fn strict(mut self, strict: bool) -> Self {
        self.settings.strict = strict;
        self
    }

    /// Check every declaration, verification and call against `checker`.
    pub fn strict_signatures<C>(mut self, checker: C) -> Self
        where C: SignatureChecker + 'static
    {
        self.checker = Some(Rc::new(checker));
        self
    }

    /// Tag a member with its kind.  Untagged members are functions.
    pub fn member(mut self, name: impl Into<String>, kind: MemberKind)
        -> Self
    {
        self.kinds.insert(name.into(), kind);
        self
    }

    /// Provide the original implementation of a member, for
    /// `then_call_original` and for spies.
    pub fn original<F>(mut self, name: impl Into<String>, f: F) -> Self
        where F: Fn(&CallArgs) -> Result<Value> + 'static
    {
        self.originals.insert(name.into(), Rc::new(f));
        self
    }

    /// Make unmatched calls delegate to the original implementation.
    pub fn spy(mut self) -> Self {
        self.spy = true;
        self
    }

    /// Install stubbed members of `subject` through `substitution`.
    pub fn target<S>(mut self, substitution: S, subject: Subject) -> Self
        where S: Substitution + 'static
    {
        self.target = Some(Target {
            substitution: Rc::new(substitution),
            subject
        });
        self
    }

    pub fn build(self) -> Double {
        let state = DoubleState {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            settings: self.settings,
            ledger: Ledger::default(),
            checker: self.checker,
            originals: self.originals,
            spy: self.spy,
            kinds: self.kinds,
            target: self.target,
            installs: BTreeMap::new(),
            sessions: Vec::new()
        };
        Double(Rc::new(RefCell::new(state)))
    }
}

/// A programmable stand-in for some callable surface.
///
/// Clones refer to the same double.  A double is neither `Send` nor `Sync`:
/// it belongs to the single thread of one test.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let dog = Double::new("dog");
/// dog.when("bark", args!("Miau")).unwrap().then_return("Wuff");
/// assert_eq!(dog.call("bark", args!("Miau")).unwrap(), Value::from("Wuff"));
/// assert_eq!(dog.call("bark", args!("Wau")).unwrap(), Value::None);
/// dog.verify("bark", args!("Miau"), 1).unwrap();
/// ```
#[derive(Clone)]
pub struct Double(Rc<RefCell<DoubleState>>);

impl Double {
    /// A lenient double: unmatched calls answer `None`.
    pub fn new(name: impl Into<String>) -> Self {
        DoubleBuilder::new(name).build()
    }

    /// A double whose unmatched calls fail.
    pub fn strict(name: impl Into<String>) -> Self {
        DoubleBuilder::new(name).strict(true).build()
    }

    pub fn builder(name: impl Into<String>) -> DoubleBuilder {
        DoubleBuilder::new(name)
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub(crate) fn id(&self) -> usize {
        self.0.borrow().id
    }

    pub fn settings(&self) -> Settings {
        self.0.borrow().settings
    }

    /// The subject this double installs itself on, if any.
    pub fn subject(&self) -> Option<Subject> {
        self.0.borrow().target.as_ref().map(|t| t.subject.clone())
    }

    /// Do both handles refer to the same double?
    pub fn ptr_eq(&self, other: &Double) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakDouble {
        WeakDouble(Rc::downgrade(&self.0))
    }

    /// Declare a stub rule for `name`.
    pub fn when(&self, name: &str, args: Args) -> Result<Stubbing> {
        self.declare(name, args, None).map(|(s, _)| s)
    }

    /// Declare a stub rule that must be called as often as `mode` says.
    ///
    /// A call beyond the upper bound fails with `UnexpectedInvocation`.  Use
    /// [`verify_expected_interactions`](Double::verify_expected_interactions)
    /// to check the lower bound.
    pub fn expect(&self, name: &str, args: Args,
                  mode: impl Into<VerificationMode>) -> Result<Stubbing>
    {
        self.declare(name, args, Some(mode.into())).map(|(s, _)| s)
    }

    /// Like [`when`](Double::when), for the lifetime of the returned guard.
    pub fn when_scoped(&self, name: &str, args: Args) -> Result<ScopedStub> {
        let (stubbing, replaced) = self.declare(name, args, None)?;
        Ok(ScopedStub{stubbing, replaced, done: false})
    }

    /// Like [`expect`](Double::expect), for the lifetime of the returned
    /// guard.
    pub fn expect_scoped(&self, name: &str, args: Args,
                         mode: impl Into<VerificationMode>)
        -> Result<ScopedStub>
    {
        let (stubbing, replaced) =
            self.declare(name, args, Some(mode.into()))?;
        Ok(ScopedStub{stubbing, replaced, done: false})
    }

    fn declare(&self, name: &str, args: Args,
               expected: Option<VerificationMode>)
        -> Result<(Stubbing, Option<DeclaredInvocation>)>
    {
        let expected = expected.map(VerificationMode::validate).transpose()?;
        let pattern = ArgumentPattern::new(args)?;
        let (id, replaced, install) = {
            let mut state = self.0.borrow_mut();
            state.check_shape(name, &pattern.shape())?;
            let kind = state.kind(name);
            if kind == MemberKind::Property && !pattern.is_empty() {
                return Err(Error::argument(format!(
                    "{} is a property and takes no arguments", name)));
            }
            debug!(double = %state.name, rule = %pattern.render(name),
                   ?expected, "declared");
            let (id, replaced) = state.ledger.declare(name, pattern, expected);
            let install = match &state.target {
                Some(t) if !state.installs.contains_key(name) =>
                    Some((t.substitution.clone(), t.subject.clone(), kind)),
                _ => None
            };
            (id, replaced, install)
        };
        if let Some((substitution, subject, kind)) = install {
            let replacement = Replacement::new(self.downgrade(), name);
            match substitution.install(&subject, name, kind, replacement) {
                Ok(handle) => {
                    self.0.borrow_mut().installs.insert(name.to_owned(),
                                                        handle);
                },
                Err(e) => {
                    self.end_rule(id, replaced)?;
                    return Err(e);
                }
            }
        }
        let stubbing = Stubbing {
            double: self.clone(),
            id,
            name: name.to_owned()
        };
        Ok((stubbing, replaced))
    }

    /// Remove a rule, or put back the rule it replaced.  Restores the member
    /// once no rule for it remains.
    fn end_rule(&self, id: usize, replaced: Option<DeclaredInvocation>)
        -> Result<()>
    {
        let restore = {
            let mut state = self.0.borrow_mut();
            let name = match replaced {
                Some(old) => {
                    let name = old.name().to_owned();
                    state.ledger.restore(old);
                    name
                },
                None => match state.ledger.remove(id) {
                    Some(rule) => rule.name().to_owned(),
                    None => return Ok(())
                }
            };
            if state.ledger.has_rules_for(&name) {
                None
            } else {
                let handle = state.installs.remove(&name);
                match (&state.target, handle) {
                    (Some(t), Some(h)) => Some((t.substitution.clone(), h)),
                    _ => None
                }
            }
        };
        if let Some((substitution, handle)) = restore {
            if let Err(e) = substitution.restore(&handle) {
                self.0.borrow_mut().installs.insert(handle.name.clone(),
                                                    handle);
                return Err(e);
            }
        }
        Ok(())
    }

    /// The original implementation of `name`: one given to the builder, or
    /// the one the substitution displaced.
    pub(crate) fn original_for(&self, name: &str) -> Option<Original> {
        let (substitution, handle) = {
            let state = self.0.borrow();
            if let Some(o) = state.originals.get(name) {
                return Some(o.clone());
            }
            match (&state.target, state.installs.get(name)) {
                (Some(t), Some(h)) => (t.substitution.clone(), h.clone()),
                _ => return None
            }
        };
        substitution.original(&handle)
    }

    /// Call a member of the double.
    pub fn call(&self, name: &str, args: Args) -> Result<Value> {
        self.call_args(name, CallArgs::new(args)?)
    }

    /// Read a property.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.call_args(name, CallArgs::default())
    }

    /// The dispatch entry point: every call routed to the double lands here.
    pub fn call_args(&self, name: &str, args: CallArgs) -> Result<Value> {
        let rules = {
            let state = self.0.borrow();
            state.check_shape(name, &args.shape())?;
            state.ledger.all_declared(name).into_iter()
                .cloned()
                .collect::<Vec<_>>()
        };
        // Matchers run unborrowed, so they may call into this double.
        let winner = select_winner(&find_matches(name, &args, &rules))
            .map(|d| d.id);
        let (actual, answer, owner, sessions) = {
            let mut state = self.0.borrow_mut();
            let winner = winner.filter(|id| state.ledger.rule(*id).is_some());
            if let Some(id) = winner {
                if let Some(rule) = state.ledger.rule(id) {
                    if rule.exhausted() {
                        let call = args.render(name);
                        let message = format!(
                            "{}.{} was called more often than expected: {} {}",
                            state.name, call, rule.render(),
                            rule.expected().map(|m| m.to_string())
                                .unwrap_or_default());
                        return Err(Error::UnexpectedInvocation {
                            call,
                            declared: vec![rule.render()],
                            message
                        });
                    }
                }
            } else if state.settings.strict && !state.spy {
                return Err(unexpected(&state, name, &args));
            }

            let actual = Rc::new(ActualInvocation::new(state.id, &state.name,
                                                       name, args));
            state.ledger.record(actual.clone());
            debug!(double = %state.name, call = %actual.render(), "called");
            let spy = state.spy;
            let rule = match winner {
                Some(id) => state.ledger.rule_mut(id),
                None => None
            };
            let answer = match rule {
                Some(rule) => {
                    rule.used += 1;
                    rule.pattern().capture(actual.args());
                    rule.chain.advance()
                },
                None if spy => Some(Answer::CallOriginal),
                None => None
            };
            state.sessions.retain(|s| s.strong_count() > 0);
            let sessions = state.sessions.iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>();
            (actual, answer, state.name.clone(), sessions)
        };
        for session in sessions {
            session.borrow_mut().record(actual.clone());
        }
        match answer {
            Some(answer) => {
                let original = match answer {
                    Answer::CallOriginal => self.original_for(name),
                    _ => None
                };
                answer.run(&owner, name, actual.args(), original)
            },
            None => Ok(Value::None)
        }
    }

    /// Check how often `name` was called with matching arguments.
    ///
    /// On success the matching calls count as verified.
    pub fn verify(&self, name: &str, args: Args,
                  mode: impl Into<VerificationMode>) -> Result<()>
    {
        let mode = mode.into().validate()?;
        let pattern = ArgumentPattern::new(args)?;
        let (calls, rules) = {
            let state = self.0.borrow();
            state.check_shape(name, &pattern.shape())?;
            let rules = state.ledger.all_declared(name).into_iter()
                .map(|d| (d.id, d.pattern().clone()))
                .collect::<Vec<_>>();
            (state.ledger.all_actuals(name), rules)
        };
        // Matchers run unborrowed, so they may call into this double.
        let selected = calls.into_iter()
            .filter(|a| rule_matches(&pattern, a.args()))
            .collect::<Vec<_>>();
        for a in selected.iter() {
            pattern.capture(a.args());
        }
        let state = self.0.borrow();
        let found = selected.iter().map(|a| a.render()).collect();
        let wanted = Wanted::new(pattern.render(name), state.seen(name))
            .with_found(found);
        let result = mode.verify(&wanted, selected.len());
        debug!(double = %state.name, wanted = %wanted.call, %mode,
               count = selected.len(), ok = result.is_ok(), "verified");
        result?;
        drop(state);
        for a in selected.iter() {
            a.mark_verified();
        }
        if mode.lower_bound() == 0 {
            let covered = rules.into_iter()
                .filter(|(_, p)| patterns_overlap(p, &pattern))
                .map(|(id, _)| id)
                .collect::<Vec<_>>();
            let mut state = self.0.borrow_mut();
            for id in covered {
                if let Some(rule) = state.ledger.rule_mut(id) {
                    rule.allow_unused = true;
                }
            }
        }
        Ok(())
    }

    /// Like [`verify`](Double::verify), with options given as signed counts.
    pub fn verify_with(&self, name: &str, args: Args, opts: VerifyOptions)
        -> Result<()>
    {
        let mode = opts.mode()?;
        self.verify(name, args, mode)
    }

    /// Every recorded call, in call order.
    pub fn invocations(&self) -> Vec<Rc<ActualInvocation>> {
        self.0.borrow().ledger.actuals().to_vec()
    }

    /// Recorded calls to `name`, in call order.
    pub fn all_actuals(&self, name: &str) -> Vec<Rc<ActualInvocation>> {
        self.0.borrow().ledger.all_actuals(name)
    }

    /// Stub rules for `name`, most recently declared first.
    pub fn all_declared(&self, name: &str) -> Vec<DeclaredInvocation> {
        self.0.borrow().ledger.all_declared(name)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Forget recorded calls, keeping stub rules.
    pub fn clear_invocations(&self) {
        self.0.borrow_mut().ledger.clear_actuals();
    }

    /// Fail on the first call that no verification claimed.
    pub fn ensure_no_unverified_interactions(&self) -> Result<()> {
        let state = self.0.borrow();
        match state.ledger.actuals().iter().find(|a| !a.verified()) {
            Some(a) => Err(Error::verification(
                a.render(), Vec::new(),
                format!("Unwanted interaction: {}", a.render()))),
            None => Ok(())
        }
    }

    /// Check the usage of every rule declared with `expect`.
    pub fn verify_expected_interactions(&self) -> Result<()> {
        let state = self.0.borrow();
        for rule in state.ledger.declared() {
            if let Some(mode) = rule.expected() {
                let wanted = Wanted::new(rule.render(),
                                         state.seen(rule.name()));
                mode.verify(&wanted, rule.used())?;
            }
        }
        Ok(())
    }

    /// Fail on the first stub rule that was never used.
    ///
    /// Rules whose expectation allows zero calls, and rules covered by a
    /// successful zero-lower-bound verification, may stay unused.
    pub fn ensure_stubs_used(&self) -> Result<()> {
        let state = self.0.borrow();
        let unused = state.ledger.declared().iter().find(|rule| {
            let may_skip = rule.allow_unused() ||
                rule.expected().map(|m| m.lower_bound() == 0)
                    .unwrap_or(false);
            rule.used() == 0 && !may_skip
        });
        match unused {
            Some(rule) => Err(unused_stub(rule)),
            None => Ok(())
        }
    }

    /// Remove every stub rule and restore every installed member.
    ///
    /// Stops at the first failed restore, leaving that member and the rest
    /// installed.
    pub fn unstub(&self) -> Result<()> {
        let (substitution, handles) = {
            let state = self.0.borrow();
            match &state.target {
                Some(t) => (Some(t.substitution.clone()),
                            state.installs.values().cloned()
                                .collect::<Vec<_>>()),
                None => (None, Vec::new())
            }
        };
        if let Some(substitution) = substitution {
            for handle in handles {
                substitution.restore(&handle)?;
                self.0.borrow_mut().installs.remove(&handle.name);
            }
        }
        let mut state = self.0.borrow_mut();
        state.ledger.clear_declared();
        debug!(double = %state.name, "unstubbed");
        Ok(())
    }

    /// Does the double hold any rule or installation?
    pub fn is_stubbed(&self) -> bool {
        let state = self.0.borrow();
        !state.ledger.declared().is_empty() || !state.installs.is_empty()
    }

    pub(crate) fn check_shape(&self, name: &str, shape: &CallShape)
        -> Result<()>
    {
        self.0.borrow().check_shape(name, shape)
    }

    pub(crate) fn attach(&self, session: Weak<RefCell<Session>>) {
        self.0.borrow_mut().sessions.push(session);
    }

    pub(crate) fn detach(&self, session: &Weak<RefCell<Session>>) {
        self.0.borrow_mut().sessions.retain(|s| !s.ptr_eq(session));
    }

    /// Verify a scoped rule's usage when its scope ends.
    fn check_scoped(&self, id: usize) -> Result<()> {
        let state = self.0.borrow();
        let rule = match state.ledger.rule(id) {
            Some(rule) => rule,
            None => return Ok(())
        };
        match rule.expected() {
            Some(mode) => {
                let wanted = Wanted::new(rule.render(),
                                         state.seen(rule.name()));
                mode.verify(&wanted, rule.used())
            },
            None if state.settings.check_usage && rule.used() == 0 &&
                !rule.allow_unused() => Err(unused_stub(rule)),
            None => Ok(())
        }
    }
}

impl fmt::Debug for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Double")
            .field("name", &state.name)
            .field("rules", &state.ledger.declared().len())
            .field("calls", &state.ledger.actuals().len())
            .finish()
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.borrow().name)
    }
}

fn unexpected(state: &DoubleState, name: &str, args: &CallArgs) -> Error {
    let call = args.render(name);
    let declared = state.ledger.all_declared(name).iter()
        .map(|d| d.render())
        .collect::<Vec<_>>();
    let listing = if declared.is_empty() {
        "(none)".to_owned()
    } else {
        declared.join("\n    ")
    };
    let message = format!("You called\n\n    {}.{},\n\nwhich is not expected. \
                           Stubbed invocations are:\n\n    {}\n",
                          state.name, call, listing);
    Error::UnexpectedInvocation{call, declared, message}
}

fn unused_stub(rule: &DeclaredInvocation) -> Error {
    Error::verification_msg(rule.render(),
                            format!("Unused stub: {}", rule.render()))
}

/// Appends answers to one stub rule.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let dog = Double::new("dog");
/// dog.when("bark", args!(ANY_REST)).unwrap()
///     .then_return("Wuff")
///     .then_raise("hoarse");
/// assert_eq!(dog.call("bark", args!()).unwrap(), Value::from("Wuff"));
/// assert_eq!(dog.call("bark", args!()).unwrap_err(),
///            Error::Raised(Value::from("hoarse")));
/// ```
pub struct Stubbing {
    double: Double,
    id: usize,
    name: String,
}

impl Stubbing {
    fn push(&mut self, answer: Answer) {
        let mut state = self.double.0.borrow_mut();
        if let Some(rule) = state.ledger.rule_mut(self.id) {
            rule.chain.push(answer);
        }
    }

    /// Answer with a value.  `()` answers `None`.
    pub fn then_return(&mut self, value: impl Into<Value>) -> &mut Self {
        self.push(Answer::Return(value.into()));
        self
    }

    /// Fail the call with [`Error::Raised`].
    pub fn then_raise(&mut self, value: impl Into<Value>) -> &mut Self {
        self.push(Answer::Raise(value.into()));
        self
    }

    /// Answer with whatever `f` computes from the actual arguments.
    pub fn then_answer<F, R>(&mut self, f: F) -> &mut Self
        where F: Fn(&CallArgs) -> R + 'static,
              R: Into<Value>
    {
        self.push(Answer::Invoke(Rc::new(move |args| Ok(f(args).into()))));
        self
    }

    /// Like [`then_answer`](Stubbing::then_answer), for a fallible `f`.
    pub fn then_try_answer<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&CallArgs) -> Result<Value> + 'static
    {
        self.push(Answer::Invoke(Rc::new(f)));
        self
    }

    /// Delegate to the original implementation.
    ///
    /// Fails with an `AnswerError` if the member has none.
    pub fn then_call_original(&mut self) -> Result<&mut Self> {
        if self.double.original_for(&self.name).is_none() {
            return Err(no_original(&self.double.name(), &self.name));
        }
        self.push(Answer::CallOriginal);
        Ok(self)
    }
}

/// A stub rule that lives until the guard ends.
///
/// Ending the scope removes the rule, or restores the rule it replaced.  It
/// also checks the rule's usage: an expectation must be met, and with
/// [`Settings::check_usage`] a plain stub must have been used.  Use
/// [`finish`](ScopedStub::finish) to get that check as a `Result`; a guard
/// that is simply dropped panics on failure instead.
#[must_use = "the stub is removed when the guard is dropped"]
pub struct ScopedStub {
    stubbing: Stubbing,
    replaced: Option<DeclaredInvocation>,
    done: bool,
}

impl ScopedStub {
    /// End the scope, reporting unmet usage.
    pub fn finish(mut self) -> Result<()> {
        self.end()
    }

    fn end(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        let double = self.stubbing.double.clone();
        let usage = double.check_scoped(self.stubbing.id);
        let restore = double.end_rule(self.stubbing.id, self.replaced.take());
        usage.and(restore)
    }
}

impl Deref for ScopedStub {
    type Target = Stubbing;

    fn deref(&self) -> &Stubbing {
        &self.stubbing
    }
}

impl DerefMut for ScopedStub {
    fn deref_mut(&mut self) -> &mut Stubbing {
        &mut self.stubbing
    }
}

impl Drop for ScopedStub {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            if !thread::panicking() {
                panic!("{}", e);
            }
        }
    }
}
