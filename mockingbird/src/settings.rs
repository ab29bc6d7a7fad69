// vim: tw=80
//! Runtime defaults for new doubles.
use std::env;

/// Environment variable that makes new doubles strict.
pub const STRICT_VAR: &str = "MOCKINGBIRD_STRICT";
/// Environment variable controlling whether scoped stubs must be used.
pub const CHECK_USAGE_VAR: &str = "MOCKINGBIRD_CHECK_USAGE";

/// Behavior shared by the doubles of one [`Registry`](crate::Registry), or set
/// on a single double through its builder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Unmatched calls fail instead of answering `None`.
    pub strict: bool,
    /// A scoped stub that was never used fails when its scope ends.
    pub check_usage: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings{strict: false, check_usage: true}
    }
}

impl Settings {
    /// The defaults, overridden by `MOCKINGBIRD_STRICT` and
    /// `MOCKINGBIRD_CHECK_USAGE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let mut settings = Settings::default();
        if let Some(v) = lookup(STRICT_VAR) {
            settings.strict = enabled(&v);
        }
        if let Some(v) = lookup(CHECK_USAGE_VAR) {
            settings.check_usage = enabled(&v);
        }
        settings
    }
}

fn enabled(v: &str) -> bool {
    !matches!(v.trim().to_ascii_lowercase().as_str(),
              "0" | "false" | "off" | "no")
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn lookup() {
        let s = Settings::from_lookup(|k| match k {
            STRICT_VAR => Some("1".to_owned()),
            CHECK_USAGE_VAR => Some(" Off".to_owned()),
            _ => None
        });
        assert_eq!(s, Settings{strict: true, check_usage: false});
        assert_eq!(Settings::from_lookup(|_| None), Settings::default());
    }

    #[test]
    fn disabling_values() {
        for v in ["0", "false", "FALSE", "off", "no"] {
            assert!(!enabled(v));
        }
        for v in ["1", "yes", "on", ""] {
            assert!(enabled(v));
        }
    }
}
