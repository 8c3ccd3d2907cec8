//! Resource limits per hardware group.
//!
//! A [`Limits`] value caps one execution box on one hardware group. A zero in
//! any numeric field means that dimension is unbounded. The same values are
//! embedded into sandboxed tasks at compile time and read back when the
//! worker's statistics are judged, see [`interpret`].

mod interpret;

pub use interpret::{LimitsVerdict, interpret};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LimitsError {
    #[error("no limits for box '{box_id}' on hardware group '{hardware_group}'")]
    MissingLimits {
        box_id: String,
        hardware_group: String,
    },

    #[error("unknown hardware group '{0}'")]
    UnknownHardwareGroup(String),

    #[error("invalid limits for box '{box_id}': {message}")]
    InvalidLimits { box_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, Validate)]
pub struct Limits {
    #[serde(default)]
    pub hardware_group: String,

    /// Wall clock seconds.
    #[serde(default)]
    #[validate(range(min = 0.0, message = "wall_time must not be negative"))]
    pub wall_time: f64,

    /// CPU seconds.
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cpu_time must not be negative"))]
    pub cpu_time: f64,

    /// Kilobytes.
    #[serde(default)]
    pub memory: u64,

    /// Maximum number of processes/threads.
    #[serde(default = "default_parallel")]
    pub parallel: u64,
}

fn default_parallel() -> u64 {
    1
}

impl Limits {
    pub fn new(
        hardware_group: impl Into<String>,
        wall_time: f64,
        cpu_time: f64,
        memory: u64,
        parallel: u64,
    ) -> Self {
        Limits {
            hardware_group: hardware_group.into(),
            wall_time,
            cpu_time,
            memory,
            parallel,
        }
    }

    /// Limits that constrain nothing.
    pub fn unbounded(hardware_group: impl Into<String>) -> Self {
        Limits::new(hardware_group, 0.0, 0.0, 0, 0)
    }

    /// Range and finiteness check, naming `box_id` on failure.
    pub fn check(&self, box_id: &str) -> Result<(), LimitsError> {
        if let Err(errors) = self.validate() {
            return Err(LimitsError::InvalidLimits {
                box_id: box_id.to_string(),
                message: common::format_validation_errors(&errors),
            });
        }
        if !self.wall_time.is_finite() || !self.cpu_time.is_finite() {
            return Err(LimitsError::InvalidLimits {
                box_id: box_id.to_string(),
                message: "time limits must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// The limit table of one exercise: hardware group → box id → limits.
///
/// Box ids are either `<test>.<box>` (one test only) or a bare `<box>`
/// name, which applies to every test without a more specific entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ExerciseLimits {
    groups: BTreeMap<String, BTreeMap<String, Limits>>,
}

impl ExerciseLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one entry. The stored copy carries `hardware_group`.
    pub fn insert(&mut self, hardware_group: &str, box_id: &str, mut limits: Limits) {
        limits.hardware_group = hardware_group.to_string();
        self.groups
            .entry(hardware_group.to_string())
            .or_default()
            .insert(box_id.to_string(), limits);
    }

    pub fn with(mut self, hardware_group: &str, box_id: &str, limits: Limits) -> Self {
        self.insert(hardware_group, box_id, limits);
        self
    }

    pub fn hardware_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Validates every entry of every hardware group.
    pub fn check(&self) -> Result<(), LimitsError> {
        for entries in self.groups.values() {
            for (box_id, limits) in entries {
                limits.check(box_id)?;
            }
        }
        Ok(())
    }

    /// Looks up the limits of one box, falling back from `<test>.<box>` to
    /// the bare box name.
    pub fn lookup(&self, hardware_group: &str, box_id: &str) -> Result<Limits, LimitsError> {
        let entries = self
            .groups
            .get(hardware_group)
            .ok_or_else(|| LimitsError::UnknownHardwareGroup(hardware_group.to_string()))?;

        let found = entries.get(box_id).or_else(|| {
            box_id
                .rsplit_once('.')
                .and_then(|(_, bare)| entries.get(bare))
        });

        match found {
            Some(limits) => {
                let mut limits = limits.clone();
                limits.hardware_group = hardware_group.to_string();
                Ok(limits)
            }
            None => Err(LimitsError::MissingLimits {
                box_id: box_id.to_string(),
                hardware_group: hardware_group.to_string(),
            }),
        }
    }

    /// [`ExerciseLimits::lookup`] followed by [`Limits::check`].
    pub fn resolve(&self, hardware_group: &str, box_id: &str) -> Result<Limits, LimitsError> {
        let limits = self.lookup(hardware_group, box_id)?;
        limits.check(box_id)?;
        tracing::debug!(
            box_id,
            hardware_group,
            wall_time = limits.wall_time,
            cpu_time = limits.cpu_time,
            memory = limits.memory,
            "resolved limits"
        );
        Ok(limits)
    }
}
