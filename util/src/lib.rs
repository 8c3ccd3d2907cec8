//! Shared building blocks for the grading engine: the per-hardware-group
//! limits model, the sandbox statistics record the worker reports, the
//! toolchain table used by compilation and execution boxes, and the
//! working-directory convention handed to the worker.

pub mod languages;
pub mod limits;
pub mod paths;
pub mod sandbox;
