//! # Configuration Module / 配置模块
//!
//! `BatchTester.toml` holds the static part of a batch: which dependencies get
//! injected, how the build tool is invoked and where the report goes. Every key
//! is optional; an absent file means the defaults below.
//!
//! `BatchTester.toml` 保存批量运行的静态部分：注入哪些依赖、如何调用构建工具以及报告写到哪里。
//! 每个键都是可选的；文件不存在时使用下面的默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{BatchError, BatchResult};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "BatchTester.toml";

/// Test-framework coordinates every project needs for its instrumentation tests to compile.
/// 每个项目的插桩测试编译所需的测试框架坐标。
pub const DEFAULT_DEPENDENCIES: [&str; 5] = [
    "com.android.support:support-annotations:25.1.0",
    "com.android.support.test:runner:0.5",
    "com.android.support.test:rules:0.5",
    "com.android.support.test.espresso:espresso-core:2.2.2",
    "com.android.support.test.espresso:espresso-intents:2.2.2",
];

#[cfg(windows)]
const DEFAULT_BUILD_COMMAND: &str = "gradlew.bat connectedAndroidTest";
#[cfg(not(windows))]
const DEFAULT_BUILD_COMMAND: &str = "./gradlew connectedAndroidTest";

/// The whole batch configuration, loaded from a TOML file.
/// 从 TOML 文件加载的完整批量配置。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    pub language: String,

    /// Dependency coordinates inserted into every `app/build.gradle`, in order.
    /// 按顺序插入每个 `app/build.gradle` 的依赖坐标。
    pub dependencies: Vec<String>,

    /// Gradle configuration used for the inserted lines.
    /// 插入行所使用的 Gradle 配置名。
    pub dependency_configuration: String,

    /// Command that runs the connected instrumentation tests, relative to the project root.
    /// 运行连接设备插桩测试的命令，相对于项目根目录。
    pub build_command: String,

    /// Extension of the source files whose imports get rewritten.
    pub source_extension: String,

    /// File name of the report written into the projects root.
    pub report_file_name: String,

    /// Pause after each rewritten test file so the operator can fix it up.
    /// 每个测试文件改写后暂停，以便操作员修正。
    pub review_pause: bool,

    /// Capture the build output instead of streaming it to the terminal.
    /// 捕获构建输出，而不是直接输出到终端。
    pub capture_build_output: bool,

    /// Batch inputs, overridden by the command line.
    /// 批量输入，会被命令行覆盖。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_package: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            dependencies: DEFAULT_DEPENDENCIES.iter().map(|d| d.to_string()).collect(),
            dependency_configuration: "androidTestCompile".to_string(),
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            source_extension: "java".to_string(),
            report_file_name: "TestResults.txt".to_string(),
            review_pause: true,
            capture_build_output: false,
            tests_dir: None,
            projects_dir: None,
            test_package: None,
        }
    }
}

impl BatchConfig {
    /// Splits `build_command` into program and arguments, expanding `~` and
    /// environment variables first.
    ///
    /// 将 `build_command` 拆分为程序和参数，先展开 `~` 和环境变量。
    pub fn build_command_parts(&self) -> BatchResult<Vec<String>> {
        let expanded = shellexpand::full(&self.build_command).map_err(|e| {
            BatchError::Configuration(format!(
                "cannot expand build command `{}`: {e}",
                self.build_command
            ))
        })?;
        let parts = shlex::split(&expanded).ok_or_else(|| {
            BatchError::Configuration(format!("cannot parse build command `{expanded}`"))
        })?;
        if parts.is_empty() {
            return Err(BatchError::Configuration(
                "build command is empty".to_string(),
            ));
        }
        Ok(parts)
    }

    /// Checks values that would make every project fail the same way.
    pub fn validate(&self) -> BatchResult<()> {
        if self.source_extension.trim().is_empty() {
            return Err(BatchError::Configuration(
                "source_extension must not be empty".to_string(),
            ));
        }
        if self.report_file_name.trim().is_empty()
            || self.report_file_name.contains(['/', '\\'])
        {
            return Err(BatchError::Configuration(format!(
                "report_file_name `{}` must be a plain file name",
                self.report_file_name
            )));
        }
        if self.dependency_configuration.trim().is_empty() {
            return Err(BatchError::Configuration(
                "dependency_configuration must not be empty".to_string(),
            ));
        }
        self.build_command_parts().map(|_| ())
    }
}

/// Parses a configuration from TOML text.
pub fn parse_config(content: &str) -> BatchResult<BatchConfig> {
    let config: BatchConfig = toml::from_str(content)
        .map_err(|e| BatchError::Configuration(format!("invalid configuration: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration file at `path`.
/// A missing file yields the defaults only when `required` is false.
///
/// 加载 `path` 处的配置文件。
/// 仅当 `required` 为 false 时，文件缺失才返回默认值。
pub fn load_config(path: &Path, required: bool) -> BatchResult<BatchConfig> {
    if !path.exists() {
        if required {
            return Err(BatchError::Configuration(format!(
                "configuration file {} does not exist",
                path.display()
            )));
        }
        return Ok(BatchConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|e| BatchError::fs(path, e))?;
    parse_config(&content)
}
