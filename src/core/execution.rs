//! # Batch Execution Engine Module / 批量执行引擎模块
//!
//! Walks the discovered projects one after another: prepare, run the
//! instrumentation tests, and on failure ask the operator whether to retry or
//! grade. Projects never run concurrently; they share one device.
//!
//! 依次处理发现的项目：准备、运行插桩测试，失败时询问操作员是重试还是评分。
//! 项目从不并发运行；它们共享同一台设备。

use colored::*;
use tracing::{info, warn};

use crate::core::discovery::Discovery;
use crate::core::lifecycle::{next_state, RunEvent, RunState};
use crate::core::models::{AndroidProject, Candidate, ProjectOutcome};
use crate::core::preparation::{is_marked_prepared, prepare_project, PreparationContext};
use crate::infra::command::BuildTool;
use crate::infra::prompt::Operator;
use crate::infra::t;
use crate::core::error::BatchError;

/// Lines of captured build output shown before the grade prompt.
const OUTPUT_TAIL_LINES: usize = 30;

/// Drives a whole batch through one operator and one build tool.
/// 通过一个操作员和一个构建工具驱动整个批量运行。
pub struct BatchRunner<'a, O: Operator + ?Sized, B: BuildTool> {
    ctx: PreparationContext<'a>,
    operator: &'a mut O,
    build_tool: &'a B,
    reprepare: bool,
}

impl<'a, O: Operator + ?Sized, B: BuildTool> BatchRunner<'a, O, B> {
    pub fn new(ctx: PreparationContext<'a>, operator: &'a mut O, build_tool: &'a B) -> Self {
        Self {
            ctx,
            operator,
            build_tool,
            reprepare: false,
        }
    }

    /// Ignore preparation markers left by earlier runs.
    pub fn reprepare(mut self, reprepare: bool) -> Self {
        self.reprepare = reprepare;
        self
    }

    /// Runs every candidate in discovery order and returns one outcome each.
    /// Rejected candidates are reported without being touched.
    ///
    /// 按发现顺序运行每个候选项目，并为每个返回一个结果。被拒绝的候选直接报告，不做任何处理。
    pub async fn run(&mut self, discovery: Discovery) -> Vec<ProjectOutcome> {
        let mut outcomes = Vec::with_capacity(discovery.candidates.len());
        for candidate in discovery.candidates {
            match candidate {
                Candidate::Ready(mut project) => {
                    if !self.reprepare && is_marked_prepared(&project, &self.ctx) {
                        info!(project = %project.title, "preparation marker found");
                        project.prepared = true;
                    }
                    outcomes.push(self.run_project(&mut project).await);
                }
                Candidate::Rejected(rejected) => {
                    println!(
                        "{}",
                        t!("project_rejected", name = &rejected.title, error = &rejected.error).red()
                    );
                    outcomes.push(ProjectOutcome::rejected(&rejected));
                }
            }
        }
        outcomes
    }

    /// Prepares one project if needed, then loops until it passes or the
    /// operator grades the failure.
    ///
    /// 如有需要先准备项目，然后循环直到通过或操作员对失败进行评分。
    pub async fn run_project(&mut self, project: &mut AndroidProject) -> ProjectOutcome {
        println!("\n{}", t!("testing_project", name = &project.title).cyan().bold());

        if let Err(error) = prepare_project(project, &self.ctx, &mut *self.operator) {
            warn!(project = %project.title, %error, "preparation failed");
            println!("{}", t!("preparation_failed", error = &error).red());
            project.record_failure(error.report_comment());
            return ProjectOutcome::from_project(project, 0);
        }

        let mut attempts = 0;
        let mut state = RunState::Prepared;
        let mut event = RunEvent::Start;
        loop {
            state = match next_state(&state, event) {
                Ok(next) => next,
                Err(invalid) => {
                    project.record_failure(format!("Internal error: {invalid}"));
                    break;
                }
            };
            event = match &state {
                RunState::Running => {
                    attempts += 1;
                    match self.build_tool.run_tests(&project.path).await {
                        Ok(outcome) => {
                            if !outcome.success() {
                                if let Some(tail) = outcome.output_tail(OUTPUT_TAIL_LINES) {
                                    println!("{}", tail.dimmed());
                                }
                            }
                            RunEvent::Exited(outcome.exit_code)
                        }
                        Err(error) => {
                            println!("{}", error.to_string().red());
                            project.record_failure(error.report_comment());
                            break;
                        }
                    }
                }
                RunState::FailedAwaitingDecision { exit_code } => {
                    let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                    println!("{}", t!("build_failed", code = code).red());
                    match self.operator.ask(&t!("grade_prompt")) {
                        Ok(answer) => RunEvent::Decided(answer),
                        Err(error) => {
                            project.record_failure(BatchError::Operator(error).report_comment());
                            break;
                        }
                    }
                }
                RunState::Passed => {
                    println!("{}", t!("project_passed", name = &project.title).green());
                    project.record_pass();
                    break;
                }
                RunState::Recorded { comment } => {
                    project.record_failure(comment.clone());
                    break;
                }
                // `next_state` never leads back to `Prepared`.
                RunState::Prepared => {
                    project.record_failure("Internal error: run loop returned to Prepared");
                    break;
                }
            };
        }
        ProjectOutcome::from_project(project, attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BatchConfig;
    use crate::core::error::BatchResult;
    use crate::core::models::Verdict;
    use crate::infra::command::BuildOutcome;
    use crate::infra::prompt::ScriptedOperator;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Replays exit codes in order.
    struct FakeGradle {
        exit_codes: RefCell<Vec<i32>>,
        calls: RefCell<usize>,
    }

    impl FakeGradle {
        fn new(codes: &[i32]) -> Self {
            Self {
                exit_codes: RefCell::new(codes.iter().rev().copied().collect()),
                calls: RefCell::new(0),
            }
        }
    }

    impl BuildTool for FakeGradle {
        fn describe(&self) -> String {
            "fake".into()
        }

        async fn run_tests(&self, _project_dir: &Path) -> BatchResult<BuildOutcome> {
            *self.calls.borrow_mut() += 1;
            Ok(BuildOutcome {
                exit_code: self.exit_codes.borrow_mut().pop(),
                output: None,
            })
        }
    }

    fn prepared_project() -> AndroidProject {
        let mut project = AndroidProject::new("Alpha", "/nonexistent/Alpha", "com.acme.app");
        project.prepared = true;
        project
    }

    fn ctx<'a>(config: &'a BatchConfig, tests: &'a Path) -> PreparationContext<'a> {
        PreparationContext {
            tests_dir: tests,
            canonical_package: "com.template",
            config,
        }
    }

    #[tokio::test]
    async fn passing_build_is_recorded() {
        let config = BatchConfig::default();
        let tests = PathBuf::from("/nonexistent/tests");
        let gradle = FakeGradle::new(&[0]);
        let mut operator = ScriptedOperator::default();
        let mut runner = BatchRunner::new(ctx(&config, &tests), &mut operator, &gradle);

        let mut project = prepared_project();
        let outcome = runner.run_project(&mut project).await;
        assert_eq!(outcome.report_line(), "Alpha - Passed");
        assert!(project.passed);
        assert_eq!(*gradle.calls.borrow(), 1);
    }

    #[tokio::test]
    async fn retries_until_operator_grades() {
        let config = BatchConfig::default();
        let tests = PathBuf::from("/nonexistent/tests");
        let gradle = FakeGradle::new(&[1, 1, 1]);
        let mut operator = ScriptedOperator::new(["", "", "flaky UI"]);
        let mut runner = BatchRunner::new(ctx(&config, &tests), &mut operator, &gradle);

        let mut project = prepared_project();
        let outcome = runner.run_project(&mut project).await;
        assert_eq!(outcome.report_line(), "Alpha - Failed - flaky UI");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(*gradle.calls.borrow(), 3);
        assert_eq!(operator.remaining(), 0);
    }

    #[tokio::test]
    async fn retry_can_end_in_a_pass() {
        let config = BatchConfig::default();
        let tests = PathBuf::from("/nonexistent/tests");
        let gradle = FakeGradle::new(&[1, 0]);
        let mut operator = ScriptedOperator::new([""]);
        let mut runner = BatchRunner::new(ctx(&config, &tests), &mut operator, &gradle);

        let mut project = prepared_project();
        let outcome = runner.run_project(&mut project).await;
        assert_eq!(outcome.verdict, Verdict::Passed);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn closed_input_ends_the_project() {
        let config = BatchConfig::default();
        let tests = PathBuf::from("/nonexistent/tests");
        let gradle = FakeGradle::new(&[1]);
        let mut operator = ScriptedOperator::default();
        let mut runner = BatchRunner::new(ctx(&config, &tests), &mut operator, &gradle);

        let mut project = prepared_project();
        let outcome = runner.run_project(&mut project).await;
        match outcome.verdict {
            Verdict::Failed { comment } => assert!(comment.starts_with("No operator decision")),
            Verdict::Passed => panic!("closed input must not pass"),
        }
    }

    #[tokio::test]
    async fn preparation_error_is_recorded_not_raised() {
        let config = BatchConfig::default();
        let tests = PathBuf::from("/nonexistent/tests");
        let gradle = FakeGradle::new(&[0]);
        let mut operator = ScriptedOperator::default();
        let mut runner = BatchRunner::new(ctx(&config, &tests), &mut operator, &gradle);

        let dir = tempfile::tempdir().unwrap();
        let mut project = AndroidProject::new("Alpha", dir.path(), "com.acme.app");
        let outcome = runner.run_project(&mut project).await;
        match outcome.verdict {
            Verdict::Failed { comment } => assert!(comment.starts_with("Preparation error: cannot copy")),
            Verdict::Passed => panic!("unprepared project must not pass"),
        }
        assert_eq!(*gradle.calls.borrow(), 0);
    }
}
