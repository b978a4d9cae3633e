//! # Data Models Module / 数据模型模块
//!
//! The projects under test and the outcome records the report is built from.
//!
//! 被测项目以及用于生成报告的结果记录。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::BatchError;

/// Relative location of the application module.
pub const APP_DIR: &str = "app";
/// Relative location of the manifest inside a project.
pub const MANIFEST_PATH: &str = "app/src/main/AndroidManifest.xml";
/// Relative location of the main source root inside a project.
pub const MAIN_SOURCE_ROOT: &str = "app/src/main/java";
/// Relative location of the instrumentation-test tree inside a project.
pub const ANDROID_TEST_DIR: &str = "app/src/androidTest";
/// Relative location of the application module's build script.
pub const BUILD_SCRIPT_PATH: &str = "app/build.gradle";
/// Local environment overrides removed before every build.
pub const LOCAL_PROPERTIES: &str = "local.properties";

/// One Android application under test.
/// 一个被测的 Android 应用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidProject {
    /// Directory name, used as the identifier in the report.
    /// 目录名，在报告中作为标识。
    pub title: String,
    pub path: PathBuf,
    /// Dotted package name from the manifest, never empty.
    /// 来自清单文件的点分包名，永不为空。
    pub package_name: String,
    pub passed: bool,
    /// Operator note explaining a failure.
    /// 操作员对失败的说明。
    pub comment: String,
    /// Set once the tests were injected and the build script patched.
    /// 注入测试并修补构建脚本后设置。
    pub prepared: bool,
}

impl AndroidProject {
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>, package_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            package_name: package_name.into(),
            passed: false,
            comment: String::new(),
            prepared: false,
        }
    }

    /// The package name as a relative path, `com.acme.app` -> `com/acme/app`.
    pub fn package_path(&self) -> PathBuf {
        self.package_name.split('.').collect()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_PATH)
    }

    pub fn main_source_root(&self) -> PathBuf {
        self.path.join(MAIN_SOURCE_ROOT)
    }

    /// Directory holding the application's own classes.
    /// 存放应用自身类的目录。
    pub fn main_package_dir(&self) -> PathBuf {
        self.main_source_root().join(self.package_path())
    }

    pub fn android_test_dir(&self) -> PathBuf {
        self.path.join(ANDROID_TEST_DIR)
    }

    pub fn build_script_path(&self) -> PathBuf {
        self.path.join(BUILD_SCRIPT_PATH)
    }

    pub fn local_properties_path(&self) -> PathBuf {
        self.path.join(LOCAL_PROPERTIES)
    }

    pub fn record_pass(&mut self) {
        self.passed = true;
        self.comment.clear();
    }

    pub fn record_failure(&mut self, comment: impl Into<String>) {
        self.passed = false;
        self.comment = comment.into();
    }
}

/// A subdirectory that looked like a project but could not be used.
/// 看起来像项目但无法使用的子目录。
#[derive(Debug)]
pub struct RejectedProject {
    pub title: String,
    pub path: PathBuf,
    pub error: BatchError,
}

/// One entry of the discovery result, in directory order.
/// 发现结果中的一项，按目录顺序排列。
#[derive(Debug)]
pub enum Candidate {
    Ready(AndroidProject),
    Rejected(RejectedProject),
}

impl Candidate {
    pub fn title(&self) -> &str {
        match self {
            Candidate::Ready(project) => &project.title,
            Candidate::Rejected(rejected) => &rejected.title,
        }
    }
}

/// Final verdict for one report line.
/// 报告中一行的最终结论。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Failed { comment: String },
}

/// What the report knows about one project.
/// 报告中关于一个项目的信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOutcome {
    pub title: String,
    pub verdict: Verdict,
    /// How many times the build command ran for this project.
    pub attempts: u32,
}

impl ProjectOutcome {
    pub fn from_project(project: &AndroidProject, attempts: u32) -> Self {
        let verdict = if project.passed {
            Verdict::Passed
        } else {
            Verdict::Failed {
                comment: project.comment.clone(),
            }
        };
        Self {
            title: project.title.clone(),
            verdict,
            attempts,
        }
    }

    pub fn rejected(rejected: &RejectedProject) -> Self {
        Self {
            title: rejected.title.clone(),
            verdict: Verdict::Failed {
                comment: rejected.error.report_comment(),
            },
            attempts: 0,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.verdict, Verdict::Passed)
    }

    /// Exact text of the report line, without the trailing newline.
    /// 报告行的确切文本，不含结尾换行符。
    pub fn report_line(&self) -> String {
        match &self.verdict {
            Verdict::Passed => format!("{} - Passed", self.title),
            Verdict::Failed { comment } => format!("{} - Failed - {}", self.title, comment),
        }
    }
}

/// Relative path of `file` under `root` as a list of UTF-8 components.
pub fn relative_components(root: &Path, file: &Path) -> Option<Vec<String>> {
    let relative = file.strip_prefix(root).ok()?;
    relative
        .components()
        .map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect()
}
