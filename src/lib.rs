//! # Android Batch Tester Library / Android 批量测试库
//!
//! Runs one shared instrumentation test suite against many Android projects:
//! each project gets the canonical `androidTest` tree, its imports fixed up,
//! the test dependencies added to `app/build.gradle`, and a connected test run
//! whose result lands in `TestResults.txt`.
//!
//! 针对多个 Android 项目运行同一套共享的插桩测试：每个项目获得标准的 `androidTest`
//! 目录树、修正后的导入、添加到 `app/build.gradle` 的测试依赖，
//! 以及一次连接设备的测试运行，其结果写入 `TestResults.txt`。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, discovery, preparation and the execution loop
//! - `infra` - Build command, file system operations and operator prompts
//! - `reporting` - Results file and console summary
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、发现、准备和执行循环
//! - `infra` - 构建命令、文件系统操作和操作员提示
//! - `reporting` - 结果文件和控制台摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::error;
pub use core::models;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

/// Picks the UI language: an explicit choice first, then the system locale.
///
/// Tries the full locale (e.g., "zh-CN"), then just the language code
/// (e.g., "en"), and finally falls back to "en".
pub fn resolve_locale(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split(['-', '_'])
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}
