//! Working-directory convention for compiled tasks.
//!
//! The engine never emits real paths. Every task argument that points into a
//! working directory is built from one of three placeholders which the
//! worker substitutes when it materialises the job.

use common::config::Config;
use serde::{Deserialize, Serialize};

/// The three logical directories a job works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Directory {
    /// Student sources, compiled artifacts.
    Source,
    /// Judge inputs and reference outputs.
    Eval,
    /// Files the worker returns with the results.
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkingDirs {
    pub source: String,
    pub eval: String,
    pub result: String,
}

impl Default for WorkingDirs {
    fn default() -> Self {
        WorkingDirs {
            source: "${SOURCE_DIR}".to_string(),
            eval: "${EVAL_DIR}".to_string(),
            result: "${RESULT_DIR}".to_string(),
        }
    }
}

impl WorkingDirs {
    pub fn from_config(config: &Config) -> Self {
        WorkingDirs {
            source: config.source_dir.clone(),
            eval: config.eval_dir.clone(),
            result: config.result_dir.clone(),
        }
    }

    pub fn root(&self, dir: Directory) -> &str {
        match dir {
            Directory::Source => &self.source,
            Directory::Eval => &self.eval,
            Directory::Result => &self.result,
        }
    }

    /// `<placeholder>/<name>`; an already-rooted `name` is returned as is.
    pub fn join(&self, dir: Directory, name: &str) -> String {
        if self.is_rooted(name) {
            return name.to_string();
        }
        let root = self.root(dir).trim_end_matches('/');
        let name = name.trim_start_matches("./").trim_start_matches('/');
        format!("{root}/{name}")
    }

    /// Whether `path` is one of the three placeholders or lies below one.
    pub fn is_rooted(&self, path: &str) -> bool {
        [&self.source, &self.eval, &self.result].iter().any(|root| {
            path.strip_prefix(root.trim_end_matches('/'))
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
