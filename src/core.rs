//! # Core Module / 核心模块
//!
//! Discovery, preparation and execution of the projects under test, plus the
//! configuration and error types they share.
//!
//! 被测项目的发现、准备和执行，以及它们共享的配置和错误类型。

pub mod config;
pub mod discovery;
pub mod error;
pub mod execution;
pub mod gradle;
pub mod imports;
pub mod lifecycle;
pub mod models;
pub mod preparation;

// Re-exports
pub use config::BatchConfig;
pub use error::{BatchError, BatchResult};
pub use execution::BatchRunner;
pub use models::AndroidProject;
