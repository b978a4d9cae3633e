//! # Error Taxonomy / 错误分类
//!
//! Every failure the batch runner can hit is one of these variants. Errors on
//! the projects root are fatal to the run; everything else is scoped to one
//! project and ends up as a comment in the report.
//!
//! 批量运行器可能遇到的所有失败都属于以下变体之一。
//! 项目根目录上的错误对整个运行是致命的；其他错误只影响单个项目，并作为注释写入报告。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by discovery, preparation, execution and reporting.
/// 发现、准备、执行和报告过程中产生的错误。
#[derive(Debug, Error)]
pub enum BatchError {
    /// A supplied path or configuration value is unusable.
    /// 提供的路径或配置值不可用。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The manifest has no usable `package` attribute.
    /// 清单文件没有可用的 `package` 属性。
    #[error("malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// Copying the canonical test tree failed.
    /// 复制标准测试目录树失败。
    #[error("cannot copy {} to {}: {reason}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("filesystem error on {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The build tool could not be started at all. A non-zero exit code is
    /// not an error, it is a test failure.
    /// 构建工具根本无法启动。非零退出码不是错误，而是测试失败。
    #[error("build tool could not be started ({command}): {source}")]
    BuildInvocation {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("operator input unavailable: {0}")]
    Operator(#[source] io::Error),
}

impl BatchError {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BatchError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Short comment written to the report when this error ends a project.
    /// 当此错误终止某个项目时写入报告的简短注释。
    pub fn report_comment(&self) -> String {
        match self {
            BatchError::MalformedManifest { reason, .. } => {
                format!("Malformed manifest: {reason}")
            }
            BatchError::BuildInvocation { source, .. } => {
                format!("Build tool could not be started: {source}")
            }
            BatchError::Operator(source) => format!("No operator decision: {source}"),
            other => format!("Preparation error: {other}"),
        }
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
