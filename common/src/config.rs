//! Process-level configuration for the grading engine.
//!
//! `Config` is loaded once from an optional `.env` file and the process
//! environment. Every value has a default, so a bare environment yields a
//! usable configuration. Exercise data (pipelines, limits, score formulas)
//! is deliberately not part of this; it arrives with each request.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Hardware group used when a caller does not name one.
    pub default_hardware_group: String,
    /// Placeholder the worker substitutes with the source directory.
    pub source_dir: String,
    /// Placeholder the worker substitutes with the evaluation directory.
    pub eval_dir: String,
    /// Placeholder the worker substitutes with the result directory.
    pub result_dir: String,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    /// Reads the configuration from the current process environment
    /// without touching the global instance.
    pub fn from_env() -> Self {
        Config {
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "grader".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "logs/grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(true),
            default_hardware_group: env::var("DEFAULT_HARDWARE_GROUP")
                .unwrap_or_else(|_| "group1".into()),
            source_dir: env::var("SOURCE_DIR_PLACEHOLDER")
                .unwrap_or_else(|_| "${SOURCE_DIR}".into()),
            eval_dir: env::var("EVAL_DIR_PLACEHOLDER").unwrap_or_else(|_| "${EVAL_DIR}".into()),
            result_dir: env::var("RESULT_DIR_PLACEHOLDER")
                .unwrap_or_else(|_| "${RESULT_DIR}".into()),
        }
    }

    /// Loads `env_path` (if it exists) and initialises the global instance.
    ///
    /// Later calls return the instance created by the first one. The log
    /// directory is created by [`crate::logger::init_logger`].
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();
        CONFIG.get_or_init(Config::from_env)
    }

    /// Returns the global instance, initialising it from the process
    /// environment if `init` was never called.
    pub fn get() -> &'static Self {
        CONFIG.get_or_init(Config::from_env)
    }
}
