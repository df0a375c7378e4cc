#![forbid(unsafe_code)]

//! Per-thread runtime configuration.
//!
//! The runtime is single-threaded, so configuration lives in a thread-local
//! slot. [`RuntimeConfig::current`] returns the installed config (or the
//! environment-derived default on first use).
//!
//! # Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MVC_RUNTIME_MAX_PROPAGATION_DEPTH` | [`RuntimeConfig::max_propagation_depth`] |

use std::cell::Cell;
use std::env;

/// Environment variable overriding the propagation depth cap.
pub const MAX_PROPAGATION_DEPTH_ENV: &str = "MVC_RUNTIME_MAX_PROPAGATION_DEPTH";

const DEFAULT_MAX_PROPAGATION_DEPTH: usize = 256;

thread_local! {
    static CURRENT: Cell<Option<RuntimeConfig>> = const { Cell::new(None) };
}

/// Tunables for change propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum nesting of change propagation (hooks, binder walks and the
    /// `set` calls they make). Exceeding it aborts the offending branch.
    pub max_propagation_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_propagation_depth: DEFAULT_MAX_PROPAGATION_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(env::var(MAX_PROPAGATION_DEPTH_ENV).ok().as_deref())
    }

    fn from_env_value(depth: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = depth {
            match raw.trim().parse::<usize>() {
                Ok(depth) => config = config.with_max_propagation_depth(depth),
                Err(_) => tracing::warn!(
                    value = raw,
                    "ignoring invalid {MAX_PROPAGATION_DEPTH_ENV}"
                ),
            }
        }
        config
    }

    /// Set the propagation depth cap (clamped to at least 1).
    #[must_use]
    pub fn with_max_propagation_depth(mut self, depth: usize) -> Self {
        self.max_propagation_depth = depth.max(1);
        self
    }

    /// Install this config for the current thread.
    pub fn install(self) {
        CURRENT.with(|slot| slot.set(Some(self)));
    }

    /// The config active on the current thread.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(|slot| match slot.get() {
            Some(config) => config,
            None => {
                let config = Self::from_env();
                slot.set(Some(config));
                config
            }
        })
    }
}
