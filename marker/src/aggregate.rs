//! # Aggregate Module
//!
//! Folds the task results of each test into one [`TestResult`]. The order of
//! checks is fixed:
//!
//! 1. execution SKIPPED gives SKIPPED;
//! 2. execution FAILED or evaluation SKIPPED gives FAILED;
//! 3. exceeded limits give FAILED whatever the judge said;
//! 4. otherwise the evaluation status decides, scored by the judge output.
//!
//! Every failing branch scores 0.

use pipeline::{CompiledJob, Task};
use util::limits::{Limits, interpret};

use crate::error::MarkerError;
use crate::types::{ResultsReport, TaskResult, TaskStatus, TestOutcome, TestResult, TestStatus};

/// Score of an evaluation task.
///
/// The first whitespace-separated token of the output is read as a number
/// and clamped into `[0, 1]`. Without a numeric token the status decides:
/// 1.0 for OK, 0.0 otherwise.
pub fn judge_score(result: &TaskResult) -> f64 {
    let parsed = result
        .output
        .as_deref()
        .and_then(|out| out.split_whitespace().next())
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|score| !score.is_nan());

    match parsed {
        Some(score) => score.clamp(0.0, 1.0),
        None if result.status == TaskStatus::Ok => 1.0,
        None => 0.0,
    }
}

/// One verdict per declared test of `job`, in declaration order.
///
/// Tasks the worker did not report count as SKIPPED.
pub fn aggregate(job: &CompiledJob, report: &ResultsReport) -> Result<Vec<TestResult>, MarkerError> {
    job.tests
        .iter()
        .map(|test| aggregate_test(job, report, test))
        .collect()
}

fn aggregate_test(
    job: &CompiledJob,
    report: &ResultsReport,
    test: &str,
) -> Result<TestResult, MarkerError> {
    let execution = single_task(job, test, Task::is_execution, "execution")?;
    let evaluation = single_task(job, test, Task::is_evaluation, "evaluation")?;

    let exec_result = reported(report, &execution.id);
    let eval_result = reported(report, &evaluation.id);

    if exec_result.status == TaskStatus::Skipped {
        return Ok(failing(test, TestStatus::Skipped, TestOutcome::ExecutionSkipped));
    }

    let limits = execution
        .sandbox
        .as_ref()
        .map(|sandbox| sandbox.limits.clone())
        .unwrap_or_else(|| Limits::unbounded(job.hardware_group.clone()));
    let mut result = failing(test, TestStatus::Failed, TestOutcome::ExecutionFailed);

    if exec_result.status == TaskStatus::Failed {
        if let Some(stats) = &exec_result.stats {
            result.limits = Some(interpret(stats, &limits));
            result.exitcode = Some(stats.exitcode);
        }
        return Ok(result);
    }

    let stats = exec_result
        .stats
        .as_ref()
        .ok_or_else(|| MarkerError::MissingStatistics(execution.id.clone()))?;
    let verdict = interpret(stats, &limits);
    result.limits = Some(verdict);
    result.exitcode = Some(stats.exitcode);

    if eval_result.status == TaskStatus::Skipped {
        result.outcome = TestOutcome::EvaluationSkipped;
        return Ok(result);
    }
    if !verdict.meets_all {
        tracing::warn!(
            test = %test,
            time_ok = verdict.time_ok,
            memory_ok = verdict.memory_ok,
            "limits exceeded, judge output discarded"
        );
        result.outcome = TestOutcome::LimitsExceeded;
        return Ok(result);
    }
    if eval_result.status == TaskStatus::Failed {
        result.outcome = TestOutcome::WrongAnswer;
        return Ok(result);
    }

    result.status = TestStatus::Ok;
    result.outcome = TestOutcome::Passed;
    result.score = judge_score(&eval_result);
    tracing::debug!(test = %test, score = result.score, "test passed");
    Ok(result)
}

fn single_task<'a>(
    job: &'a CompiledJob,
    test: &'a str,
    pick: fn(&Task) -> bool,
    kind: &str,
) -> Result<&'a Task, MarkerError> {
    let mut tasks = job.tasks_of(test).filter(|t| pick(*t));
    match (tasks.next(), tasks.next()) {
        (Some(task), None) => Ok(task),
        _ => Err(MarkerError::InvalidReport(format!(
            "job has no single {kind} task for test '{test}'"
        ))),
    }
}

fn reported(report: &ResultsReport, task_id: &str) -> TaskResult {
    report
        .result(task_id)
        .cloned()
        .unwrap_or_else(|| TaskResult::skipped(task_id))
}

fn failing(test: &str, status: TestStatus, outcome: TestOutcome) -> TestResult {
    TestResult {
        test_id: test.to_string(),
        status,
        outcome,
        score: 0.0,
        limits: None,
        exitcode: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{BoxCategory, SandboxSpec};
    use util::sandbox::SandboxStats;

    fn task(id: &str, test: &str, task_type: BoxCategory, limits: Option<Limits>) -> Task {
        Task {
            id: id.to_string(),
            priority: 1,
            command_binary: "bin".to_string(),
            arguments: vec![],
            task_type,
            test_id: Some(test.to_string()),
            sandbox: limits.map(|limits| SandboxSpec {
                limits,
                chdir: "${SOURCE_DIR}".to_string(),
                stdin: None,
                stdout: None,
                stderr: None,
            }),
        }
    }

    fn job() -> CompiledJob {
        let limits = Limits::new("group1", 2.0, 1.0, 1024, 1);
        CompiledJob {
            job_id: "job".to_string(),
            hardware_group: "group1".to_string(),
            tests: vec!["t1".to_string()],
            tasks: vec![
                task("t1.run", "t1", BoxCategory::Execution, Some(limits)),
                task("t1.judge", "t1", BoxCategory::Evaluation, None),
            ],
        }
    }

    fn report(results: Vec<TaskResult>) -> ResultsReport {
        ResultsReport {
            job_id: "job".to_string(),
            error_message: None,
            results,
        }
    }

    fn ran(time: f64, memory: u64) -> TaskResult {
        TaskResult::new("t1.run", TaskStatus::Ok).with_stats(SandboxStats::finished(time, time, memory))
    }

    #[test]
    fn test_judge_score_reads_first_token() {
        let ok = TaskResult::new("j", TaskStatus::Ok);
        assert_eq!(judge_score(&ok.clone().with_output("0.75 extra text")), 0.75);
        assert_eq!(judge_score(&ok.clone().with_output("  7\n")), 1.0);
        assert_eq!(judge_score(&ok.clone().with_output("-3")), 0.0);
        assert_eq!(judge_score(&ok.clone().with_output("accepted")), 1.0);
        assert_eq!(judge_score(&ok), 1.0);
        assert_eq!(judge_score(&TaskResult::new("j", TaskStatus::Failed)), 0.0);
    }

    #[test]
    fn test_passed() {
        let results = aggregate(
            &job(),
            &report(vec![ran(0.5, 100), TaskResult::new("t1.judge", TaskStatus::Ok).with_output("0.5")]),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, TestStatus::Ok);
        assert_eq!(results[0].outcome, TestOutcome::Passed);
        assert_eq!(results[0].score, 0.5);
        assert_eq!(results[0].exitcode, Some(0));
    }

    #[test]
    fn test_limits_dominate_judge() {
        let results = aggregate(
            &job(),
            &report(vec![ran(1.5, 100), TaskResult::new("t1.judge", TaskStatus::Ok).with_output("1.0")]),
        )
        .unwrap();
        assert_eq!(results[0].status, TestStatus::Failed);
        assert_eq!(results[0].outcome, TestOutcome::LimitsExceeded);
        assert_eq!(results[0].score, 0.0);
        assert!(!results[0].limits.unwrap().time_ok);
    }

    #[test]
    fn test_wrong_answer() {
        let results = aggregate(
            &job(),
            &report(vec![ran(0.1, 100), TaskResult::new("t1.judge", TaskStatus::Failed).with_output("0.9")]),
        )
        .unwrap();
        assert_eq!(results[0].status, TestStatus::Failed);
        assert_eq!(results[0].outcome, TestOutcome::WrongAnswer);
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn test_skipped_evaluation_fails() {
        let results = aggregate(
            &job(),
            &report(vec![ran(0.1, 100), TaskResult::skipped("t1.judge")]),
        )
        .unwrap();
        assert_eq!(results[0].status, TestStatus::Failed);
        assert_eq!(results[0].outcome, TestOutcome::EvaluationSkipped);
    }

    #[test]
    fn test_unreported_tasks_are_skipped() {
        let results = aggregate(&job(), &report(vec![])).unwrap();
        assert_eq!(results[0].status, TestStatus::Skipped);
        assert_eq!(results[0].outcome, TestOutcome::ExecutionSkipped);
        assert_eq!(results[0].score, 0.0);
        assert!(results[0].limits.is_none());
    }

    #[test]
    fn test_failed_execution_without_statistics() {
        let results = aggregate(
            &job(),
            &report(vec![
                TaskResult::new("t1.run", TaskStatus::Failed),
                TaskResult::new("t1.judge", TaskStatus::Ok),
            ]),
        )
        .unwrap();
        assert_eq!(results[0].status, TestStatus::Failed);
        assert_eq!(results[0].outcome, TestOutcome::ExecutionFailed);
        assert_eq!(results[0].score, 0.0);
        assert!(results[0].limits.is_none());
        assert!(results[0].exitcode.is_none());
    }

    #[test]
    fn test_successful_execution_without_statistics() {
        let err = aggregate(
            &job(),
            &report(vec![
                TaskResult::new("t1.run", TaskStatus::Ok),
                TaskResult::new("t1.judge", TaskStatus::Ok),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, MarkerError::MissingStatistics(ref id) if id == "t1.run"));
    }

    #[test]
    fn test_job_without_evaluation_task() {
        let mut job = job();
        job.tasks.pop();
        assert!(matches!(
            aggregate(&job, &report(vec![ran(0.1, 1)])),
            Err(MarkerError::InvalidReport(_))
        ));
    }
}
