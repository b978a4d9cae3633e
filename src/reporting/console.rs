//! # Console Reporting Module / 控制台报告模块
//!
//! Colored end-of-batch summary for the operator.
//!
//! 为操作员打印的彩色批量运行摘要。

use colored::*;

use crate::core::models::{ProjectOutcome, Verdict};
use crate::infra::t;

/// Prints a formatted summary of the batch to the console.
///
/// 在控制台打印格式化的批量运行摘要。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed  | Alpha                          | 1 attempt(s)
///   - Failed  | Beta                           | 3 attempt(s)  flaky UI
/// ```
pub fn print_summary(outcomes: &[ProjectOutcome]) {
    println!("\n{}", t!("test_summary_banner").bold());

    for outcome in outcomes {
        let (status, note) = match &outcome.verdict {
            Verdict::Passed => (t!("status_passed").green(), String::new()),
            Verdict::Failed { comment } => (t!("status_failed").red(), comment.clone()),
        };
        println!(
            "  - {:<8} | {:<30} | {:>2} {}  {}",
            status,
            outcome.title,
            outcome.attempts,
            t!("attempts_suffix"),
            note.dimmed()
        );
    }

    let passed = outcomes.iter().filter(|o| o.is_passed()).count();
    let line = t!("summary_counts", passed = passed, total = outcomes.len());
    if passed == outcomes.len() {
        println!("\n{}", line.green().bold());
    } else {
        println!("\n{}", line.yellow().bold());
    }
}
