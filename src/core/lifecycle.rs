//! # Run Lifecycle / 运行生命周期
//!
//! The per-project execution loop as an explicit state machine. `next_state`
//! is pure, so the retry/accept decision is testable without a device or a
//! console.
//!
//! ```text
//! Prepared --Start--> Running
//! Running --Exited(0)--> Passed
//! Running --Exited(not 0)--> FailedAwaitingDecision
//! FailedAwaitingDecision --Decided("")--> Running        (retry)
//! FailedAwaitingDecision --Decided(grade)--> Recorded     (final)
//! ```
//!
//! 以显式状态机表示每个项目的执行循环。`next_state` 是纯函数，
//! 因此重试/接受的决策无需设备或控制台即可测试。

use thiserror::Error;

/// Where a project is in its execution loop.
/// 项目在执行循环中所处的位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Tests injected, not yet run.
    Prepared,
    /// The build command is running.
    Running,
    /// Terminal: exit code zero.
    Passed,
    /// The build failed; the operator has to grade or retry.
    FailedAwaitingDecision { exit_code: Option<i32> },
    /// Terminal: failure accepted with the operator's comment.
    Recorded { comment: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Passed | RunState::Recorded { .. })
    }
}

/// Something that happened to a project.
/// 发生在项目上的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Start,
    /// The build command exited. `None` when it was killed by a signal.
    Exited(Option<i32>),
    /// The operator answered the failure prompt.
    Decided(String),
}

/// An event that is not valid in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {event:?} is not valid in state {state:?}")]
pub struct InvalidTransition {
    pub state: RunState,
    pub event: RunEvent,
}

/// Transition table of the execution loop.
///
/// Operator input is trimmed; an empty answer means retry, anything else is
/// recorded as the failure comment.
///
/// 执行循环的转换表。操作员输入会去除首尾空白；空回答表示重试，其他任何内容都作为失败注释记录。
pub fn next_state(state: &RunState, event: RunEvent) -> Result<RunState, InvalidTransition> {
    match (state, event) {
        (RunState::Prepared, RunEvent::Start) => Ok(RunState::Running),
        (RunState::Running, RunEvent::Exited(Some(0))) => Ok(RunState::Passed),
        (RunState::Running, RunEvent::Exited(exit_code)) => {
            Ok(RunState::FailedAwaitingDecision { exit_code })
        }
        (RunState::FailedAwaitingDecision { .. }, RunEvent::Decided(input)) => {
            let comment = input.trim();
            if comment.is_empty() {
                Ok(RunState::Running)
            } else {
                Ok(RunState::Recorded {
                    comment: comment.to_string(),
                })
            }
        }
        (state, event) => Err(InvalidTransition {
            state: state.clone(),
            event,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_on_first_attempt() {
        let running = next_state(&RunState::Prepared, RunEvent::Start).unwrap();
        assert_eq!(running, RunState::Running);
        let done = next_state(&running, RunEvent::Exited(Some(0))).unwrap();
        assert_eq!(done, RunState::Passed);
        assert!(done.is_terminal());
    }

    #[test]
    fn empty_answer_retries_and_grade_records() {
        let failed = next_state(&RunState::Running, RunEvent::Exited(Some(1))).unwrap();
        assert_eq!(failed, RunState::FailedAwaitingDecision { exit_code: Some(1) });

        let retry = next_state(&failed, RunEvent::Decided("   ".into())).unwrap();
        assert_eq!(retry, RunState::Running);

        let recorded = next_state(&failed, RunEvent::Decided(" flaky UI \n".into())).unwrap();
        assert_eq!(
            recorded,
            RunState::Recorded {
                comment: "flaky UI".into()
            }
        );
    }

    #[test]
    fn killed_build_counts_as_failure() {
        let failed = next_state(&RunState::Running, RunEvent::Exited(None)).unwrap();
        assert_eq!(failed, RunState::FailedAwaitingDecision { exit_code: None });
    }

    #[test]
    fn terminal_states_accept_nothing() {
        assert!(next_state(&RunState::Passed, RunEvent::Start).is_err());
        let recorded = RunState::Recorded {
            comment: "x".into(),
        };
        assert!(next_state(&recorded, RunEvent::Decided("y".into())).is_err());
        let err = next_state(&RunState::Prepared, RunEvent::Exited(Some(0))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "event Exited(Some(0)) is not valid in state Prepared"
        );
    }
}
