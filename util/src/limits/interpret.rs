use serde::Serialize;

use super::Limits;
use crate::sandbox::SandboxStats;

/// How reported usage compares to the limits it ran under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitsVerdict {
    pub time_ok: bool,
    pub memory_ok: bool,
    pub meets_all: bool,
    /// `memory / limit`, or 0 when memory is unbounded.
    pub used_memory_ratio: f64,
    /// The larger of `cpu / cpu_limit` and `wall / wall_limit`; unbounded
    /// dimensions contribute 0.
    pub used_time_ratio: f64,
}

/// `used / limit`, defined as 0 for an unbounded (zero) limit.
fn ratio(used: f64, limit: f64) -> f64 {
    if limit == 0.0 { 0.0 } else { used / limit }
}

/// Judges `stats` against `limits`. A zero limit never fails its dimension.
pub fn interpret(stats: &SandboxStats, limits: &Limits) -> LimitsVerdict {
    let cpu_ok = limits.cpu_time == 0.0 || stats.time <= limits.cpu_time;
    let wall_ok = limits.wall_time == 0.0 || stats.wall_time <= limits.wall_time;
    let time_ok = cpu_ok && wall_ok;
    let memory_ok = limits.memory == 0 || stats.memory <= limits.memory;

    let used_time_ratio = ratio(stats.time, limits.cpu_time)
        .max(ratio(stats.wall_time, limits.wall_time));
    let used_memory_ratio = ratio(stats.memory as f64, limits.memory as f64);

    LimitsVerdict {
        time_ok,
        memory_ok,
        meets_all: time_ok && memory_ok,
        used_memory_ratio,
        used_time_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_limits() {
        let stats = SandboxStats::finished(0.5, 0.8, 1000);
        let limits = Limits::new("group1", 2.0, 1.0, 4000, 1);
        let verdict = interpret(&stats, &limits);
        assert!(verdict.time_ok);
        assert!(verdict.memory_ok);
        assert!(verdict.meets_all);
        assert_eq!(verdict.used_memory_ratio, 0.25);
        assert_eq!(verdict.used_time_ratio, 0.5);
    }

    #[test]
    fn test_cpu_time_exceeded() {
        let stats = SandboxStats::finished(1.5, 1.6, 10);
        let limits = Limits::new("group1", 0.0, 1.0, 0, 1);
        let verdict = interpret(&stats, &limits);
        assert!(!verdict.time_ok);
        assert!(verdict.memory_ok);
        assert!(!verdict.meets_all);
        assert_eq!(verdict.used_time_ratio, 1.5);
    }

    #[test]
    fn test_wall_time_exceeded() {
        let stats = SandboxStats::finished(0.1, 3.0, 10);
        let limits = Limits::new("group1", 2.0, 1.0, 0, 1);
        assert!(!interpret(&stats, &limits).time_ok);
    }

    #[test]
    fn test_memory_exceeded() {
        let stats = SandboxStats::finished(0.1, 0.1, 5000);
        let limits = Limits::new("group1", 1.0, 1.0, 4000, 1);
        let verdict = interpret(&stats, &limits);
        assert!(verdict.time_ok);
        assert!(!verdict.memory_ok);
        assert!(!verdict.meets_all);
    }

    #[test]
    fn test_zero_limits_are_unbounded() {
        let stats = SandboxStats::finished(1e6, 1e6, u64::MAX);
        let verdict = interpret(&stats, &Limits::unbounded("group1"));
        assert!(verdict.time_ok);
        assert!(verdict.memory_ok);
        assert!(verdict.meets_all);
    }

    #[test]
    fn test_zero_limit_ratio_is_zero_not_division() {
        let stats = SandboxStats::finished(3.0, 4.0, 1234);
        let verdict = interpret(&stats, &Limits::unbounded("group1"));
        assert_eq!(verdict.used_time_ratio, 0.0);
        assert_eq!(verdict.used_memory_ratio, 0.0);
        assert!(verdict.used_time_ratio.is_finite());
    }

    #[test]
    fn test_each_zero_field_independently_ok() {
        let stats = SandboxStats::finished(10.0, 10.0, 10_000);
        let only_memory = Limits::new("group1", 0.0, 0.0, 100, 1);
        let verdict = interpret(&stats, &only_memory);
        assert!(verdict.time_ok);
        assert!(!verdict.memory_ok);

        let only_time = Limits::new("group1", 1.0, 0.0, 0, 1);
        let verdict = interpret(&stats, &only_time);
        assert!(!verdict.time_ok);
        assert!(verdict.memory_ok);
    }

    #[test]
    fn test_exactly_at_limit_is_ok() {
        let stats = SandboxStats::finished(1.0, 2.0, 4000);
        let limits = Limits::new("group1", 2.0, 1.0, 4000, 1);
        assert!(interpret(&stats, &limits).meets_all);
    }
}
