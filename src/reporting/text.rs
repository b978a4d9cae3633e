//! # Results File / 结果文件
//!
//! The flat `TestResults.txt` written into the projects root once the batch is
//! done. One line per project, never translated.
//!
//! 批量运行结束后写入项目根目录的扁平 `TestResults.txt`。每个项目一行，从不翻译。

use std::path::{Path, PathBuf};

use crate::core::error::BatchResult;
use crate::core::models::ProjectOutcome;
use crate::infra::fs::{silent_remove, write_text};

/// Renders every outcome as `<title> - Passed` or `<title> - Failed - <comment>`.
pub fn render_report(outcomes: &[ProjectOutcome]) -> String {
    outcomes
        .iter()
        .map(|outcome| format!("{}\n", outcome.report_line()))
        .collect()
}

/// Replaces `<projects_root>/<file_name>` with the rendered report.
///
/// 用渲染后的报告替换 `<projects_root>/<file_name>`。
///
/// # Returns
/// The path of the written report.
pub fn write_report(projects_root: &Path, file_name: &str, outcomes: &[ProjectOutcome]) -> BatchResult<PathBuf> {
    let path = projects_root.join(file_name);
    silent_remove(&path)?;
    write_text(&path, &render_report(outcomes))?;
    Ok(path)
}
