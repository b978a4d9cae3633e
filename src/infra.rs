//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the batch tester,
//! including the build command, file system operations, operator prompts and
//! i18n support.
//!
//! 此模块为批量测试器提供基础设施服务，
//! 包括构建命令、文件系统操作、操作员提示和国际化支持。

pub mod command;
pub mod fs;
pub mod prompt;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
