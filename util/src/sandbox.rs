use serde::{Deserialize, Serialize};

/// Final state of a sandboxed process as classified by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum SandboxStatus {
    /// Exited normally.
    #[serde(rename = "OK")]
    Ok,
    /// Runtime error (non-zero exit code).
    #[serde(rename = "RE")]
    RuntimeError,
    /// Killed by a signal.
    #[serde(rename = "SG")]
    Signaled,
    /// Killed for exceeding a time limit.
    #[serde(rename = "TO")]
    TimedOut,
    /// Internal sandbox failure.
    #[serde(rename = "XX")]
    Internal,
}

/// Resource usage of one execution task, as reported by the worker.
///
/// Times are in seconds, memory in kilobytes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SandboxStats {
    pub exitcode: i32,
    #[serde(default)]
    pub exitsig: Option<i32>,
    /// CPU time.
    pub time: f64,
    pub wall_time: f64,
    pub memory: u64,
    #[serde(default)]
    pub max_rss: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub killed: bool,
    pub status: SandboxStatus,
}

impl SandboxStats {
    /// Stats of a process that finished cleanly with the given usage.
    pub fn finished(time: f64, wall_time: f64, memory: u64) -> Self {
        SandboxStats {
            exitcode: 0,
            exitsig: None,
            time,
            wall_time,
            memory,
            max_rss: memory,
            message: String::new(),
            killed: false,
            status: SandboxStatus::Ok,
        }
    }
}
