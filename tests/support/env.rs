//! Environment isolation for settings tests.
//!
//! Tests touching process-wide variables are marked `#[serial]`, which is
//! what makes the `unsafe` calls below sound.

use std::ffi::OsStr;

/// Clears `keys` on creation and again on drop.
pub struct EnvGuard {
    keys: Vec<&'static str>,
}

impl EnvGuard {
    pub fn new(keys: &[&'static str]) -> Self {
        for key in keys {
            remove_var(key);
        }
        Self {
            keys: keys.to_vec(),
        }
    }

    /// Set one of the guarded variables.
    pub fn set(&self, key: &'static str, value: impl AsRef<OsStr>) {
        assert!(self.keys.contains(&key), "{key} is not guarded");
        // SAFETY: callers run under `#[serial]`.
        unsafe { std::env::set_var(key, value) }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            remove_var(key);
        }
    }
}

fn remove_var(key: &str) {
    // SAFETY: callers run under `#[serial]`.
    unsafe { std::env::remove_var(key) }
}
