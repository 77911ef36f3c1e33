//! Engine configuration.

use std::fmt;

use fence_schema::ActorId;
use thiserror::Error;

use crate::matcher::Policy;

/// Errors building an [`EngineConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("threshold must be at least 1")]
    ZeroThreshold,
}

/// Which processes the engine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFilter {
    #[default]
    All,
    Actor(ActorId),
}

impl TargetFilter {
    /// Map the raw CLI value; pid 0 means every process.
    pub fn from_raw(pid: ActorId) -> Self {
        match pid {
            0 => TargetFilter::All,
            pid => TargetFilter::Actor(pid),
        }
    }

    pub fn admits(&self, pid: ActorId) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::Actor(target) => *target == pid,
        }
    }
}

impl fmt::Display for TargetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFilter::All => write!(f, "all"),
            TargetFilter::Actor(pid) => write!(f, "{}", pid),
        }
    }
}

/// Immutable per-session configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    policy: Policy,
    threshold: u32,
    target: TargetFilter,
}

impl EngineConfig {
    /// Build a config. A zero threshold is rejected.
    pub fn new(policy: Policy, threshold: u32, target: TargetFilter) -> Result<Self, ConfigError> {
        if threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(Self {
            policy,
            threshold,
            target,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn target(&self) -> TargetFilter {
        self.target
    }
}
