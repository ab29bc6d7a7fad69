// vim: tw=80
//! Which double stands in for which subject.
use std::rc::Rc;

use tracing::debug;

use crate::{
    double::Double,
    error::Result,
    settings::Settings,
    substitution::{Subject, Substitution}
};

/// A table of subjects and the doubles observing them.
///
/// A registry is an ordinary value: create one per test, or share one by
/// reference between the pieces of a test that need it.
///
/// # Examples
/// ```
/// # use mockingbird::*;
/// let board = Patchboard::new();
/// let path = Subject::named("os.path");
/// board.define(&path, "exists", |_| Ok(Value::from(false)));
///
/// let mut registry = Registry::new().substitution(board.clone());
/// registry.observe(&path)
///     .when("exists", args!("/etc")).unwrap()
///     .then_return(true);
/// assert_eq!(board.invoke(&path, "exists", args!("/etc")).unwrap(),
///            Value::from(true));
///
/// registry.unstub_all().unwrap();
/// assert_eq!(board.invoke(&path, "exists", args!("/etc")).unwrap(),
///            Value::from(false));
/// assert!(registry.is_empty());
/// ```
#[derive(Default)]
pub struct Registry {
    entries: Vec<(Subject, Double)>,
    settings: Settings,
    substitution: Option<Rc<dyn Substitution>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose new doubles use `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Registry{settings, .. Self::default()}
    }

    /// Install the doubles that [`observe`](Registry::observe) creates
    /// through `substitution`.
    pub fn substitution<S>(mut self, substitution: S) -> Self
        where S: Substitution + 'static
    {
        self.substitution = Some(Rc::new(substitution));
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Associate `double` with `subject`, replacing any previous double.
    /// Registering the same pair again does nothing.
    pub fn register(&mut self, subject: Subject, double: Double) {
        match self.entries.iter_mut().find(|(s, _)| *s == subject) {
            Some((_, d)) if d.ptr_eq(&double) => (),
            Some((_, d)) => *d = double,
            None => {
                debug!(%subject, double = %double, "registered");
                self.entries.push((subject, double));
            }
        }
    }

    /// The double observing `subject`, creating it on first use.
    pub fn observe(&mut self, subject: &Subject) -> Double {
        if let Some(d) = self.mock_for(subject) {
            return d;
        }
        let mut builder = Double::builder(subject.to_string())
            .settings(self.settings);
        if let Some(s) = &self.substitution {
            builder = builder.target(s.clone(), subject.clone());
        }
        let double = builder.build();
        self.register(subject.clone(), double.clone());
        double
    }

    pub fn mock_for(&self, subject: &Subject) -> Option<Double> {
        self.entries.iter()
            .find(|(s, _)| s == subject)
            .map(|(_, d)| d.clone())
    }

    pub fn subject_of(&self, double: &Double) -> Option<Subject> {
        self.entries.iter()
            .find(|(_, d)| d.ptr_eq(double))
            .map(|(s, _)| s.clone())
    }

    /// Forget `subject` without restoring anything.  Unregistering an
    /// unknown subject does nothing.
    pub fn unregister(&mut self, subject: &Subject) -> Option<Double> {
        let i = self.entries.iter().position(|(s, _)| s == subject)?;
        debug!(%subject, "unregistered");
        Some(self.entries.remove(i).1)
    }

    /// Restore everything `subject`'s double installed, then forget it.
    ///
    /// If a restore fails the double stays registered.
    pub fn unstub(&mut self, subject: &Subject) -> Result<()> {
        if let Some(d) = self.mock_for(subject) {
            d.unstub()?;
            self.unregister(subject);
        }
        Ok(())
    }

    /// Unstub every registered double, most recent first.  Stops at the first
    /// failure.
    pub fn unstub_all(&mut self) -> Result<()> {
        while let Some((subject, double)) = self.entries.last().cloned() {
            double.unstub()?;
            self.unregister(&subject);
        }
        Ok(())
    }

    /// Forget every double without restoring anything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn doubles(&self) -> Vec<Double> {
        self.entries.iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
