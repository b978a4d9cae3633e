//! # Project Preparation Module / 项目准备模块
//!
//! Turns a discovered project into one that builds the canonical
//! instrumentation tests: stale environment removed, test tree replaced,
//! imports rewritten, dependencies declared. A JSON marker in the project root
//! records a finished preparation so a restarted batch does not redo it.
//!
//! 将发现的项目转换为可以构建标准插桩测试的项目：删除过期的环境配置、替换测试目录树、
//! 改写导入、声明依赖。项目根目录中的 JSON 标记记录已完成的准备，
//! 使重新启动的批量运行不会重复执行。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::config::BatchConfig;
use crate::core::error::{BatchError, BatchResult};
use crate::core::gradle::patch_build_script;
use crate::core::imports::{rewrite_test_source, synthesize_imports};
use crate::core::models::AndroidProject;
use crate::infra::fs::{copy_tree, list_source_files, read_text, remove_tree, silent_remove, write_text};
use crate::infra::prompt::Operator;
use crate::infra::t;

/// File in the project root recording a finished preparation.
pub const MARKER_FILE: &str = ".batch-tester.json";

/// Persisted record of a finished preparation.
/// 已完成准备的持久化记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationMarker {
    pub package_name: String,
    pub canonical_tests: PathBuf,
    pub test_package: String,
    pub prepared_at: DateTime<Utc>,
    pub tool_version: String,
}

/// Inputs shared by every project of a batch.
/// 批量中每个项目共享的输入。
#[derive(Debug, Clone, Copy)]
pub struct PreparationContext<'a> {
    /// Canonical instrumentation-test tree copied into each project.
    pub tests_dir: &'a Path,
    /// Package the canonical tests were written against.
    pub canonical_package: &'a str,
    pub config: &'a BatchConfig,
}

/// What preparing one project changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationReport {
    /// `true` when the guard short-circuited and nothing was touched.
    pub skipped: bool,
    pub removed_local_properties: bool,
    pub replaced_existing_tests: bool,
    pub test_files: Vec<PathBuf>,
    pub imports: Vec<String>,
    pub dependency_lines_inserted: usize,
}

pub fn marker_path(project_path: &Path) -> PathBuf {
    project_path.join(MARKER_FILE)
}

/// Reads the marker of a project. Missing or unreadable markers yield `None`.
/// 读取项目的标记。缺失或无法读取的标记返回 `None`。
pub fn load_marker(project_path: &Path) -> Option<PreparationMarker> {
    let path = marker_path(project_path);
    if !path.is_file() {
        return None;
    }
    let parsed = read_text(&path).and_then(|text| {
        serde_json::from_str::<PreparationMarker>(&text).map_err(|e| {
            BatchError::fs(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    });
    match parsed {
        Ok(marker) => Some(marker),
        Err(error) => {
            warn!(%error, "ignoring unreadable preparation marker");
            None
        }
    }
}

/// `true` when a marker from an earlier run covers this project with the same
/// canonical tests and test package.
pub fn is_marked_prepared(project: &AndroidProject, ctx: &PreparationContext<'_>) -> bool {
    load_marker(&project.path).is_some_and(|marker| {
        marker.package_name == project.package_name
            && marker.canonical_tests.as_path() == ctx.tests_dir
            && marker.test_package.as_str() == ctx.canonical_package
    })
}

fn write_marker(project: &AndroidProject, ctx: &PreparationContext<'_>) -> BatchResult<()> {
    let marker = PreparationMarker {
        package_name: project.package_name.clone(),
        canonical_tests: ctx.tests_dir.to_path_buf(),
        test_package: ctx.canonical_package.to_string(),
        prepared_at: Utc::now(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let path = marker_path(&project.path);
    let json = serde_json::to_string_pretty(&marker)
        .map_err(|e| BatchError::fs(&path, std::io::Error::other(e)))?;
    write_text(&path, &json)
}

/// Prepares `project` unless it already is.
///
/// Steps, in order: remove `local.properties`, delete the old
/// `app/src/androidTest`, copy the canonical tree in its place, rewrite the
/// imports of every copied test file (pausing for review after each one),
/// patch `app/build.gradle`, then set `prepared` and write the marker.
///
/// 准备 `project`（除非已准备过）。
/// 步骤依次为：删除 `local.properties`，删除旧的 `app/src/androidTest`，
/// 在原位置复制标准目录树，改写每个复制的测试文件的导入（每个文件后暂停以供审阅），
/// 修补 `app/build.gradle`，然后设置 `prepared` 并写入标记。
///
/// # Errors
/// Any failure leaves the project partially prepared and `prepared` unset.
pub fn prepare_project<O: Operator + ?Sized>(
    project: &mut AndroidProject,
    ctx: &PreparationContext<'_>,
    operator: &mut O,
) -> BatchResult<PreparationReport> {
    if project.prepared {
        debug!(project = %project.title, "already prepared");
        return Ok(PreparationReport {
            skipped: true,
            ..PreparationReport::default()
        });
    }
    info!(project = %project.title, "preparing project");

    let mut report = PreparationReport {
        removed_local_properties: silent_remove(&project.local_properties_path())?,
        ..PreparationReport::default()
    };

    let test_dir = project.android_test_dir();
    report.replaced_existing_tests = remove_tree(&test_dir)?;
    copy_tree(ctx.tests_dir, &test_dir)?;

    let extension = ctx.config.source_extension.as_str();
    let main_sources = list_source_files(&project.main_package_dir(), extension)?;
    if main_sources.is_empty() {
        warn!(
            project = %project.title,
            dir = %project.main_package_dir().display(),
            "no main sources found under the package directory"
        );
    }
    report.imports = synthesize_imports(&project.package_name, &project.main_source_root(), &main_sources);
    report.test_files = list_source_files(&test_dir, extension)?;

    for test_file in &report.test_files {
        let original = read_text(test_file)?;
        let rewritten = rewrite_test_source(&original, &report.imports, ctx.canonical_package);
        write_text(test_file, &rewritten)?;
        debug!(file = %test_file.display(), "rewrote imports");

        if ctx.config.review_pause {
            operator
                .pause(&t!("review_prompt", path = test_file.display()))
                .map_err(BatchError::Operator)?;
        }
    }

    let build_script = project.build_script_path();
    let script = read_text(&build_script)?;
    let patch = patch_build_script(
        &script,
        &ctx.config.dependency_configuration,
        &ctx.config.dependencies,
    );
    debug!(
        project = %project.title,
        blocks = patch.blocks_patched,
        lines = patch.lines_inserted,
        "patched build script"
    );
    if patch.content != script {
        write_text(&build_script, &patch.content)?;
    }
    report.dependency_lines_inserted = patch.lines_inserted;

    project.prepared = true;
    write_marker(project, ctx)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::prompt::ScriptedOperator;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, AndroidProject, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Alpha");
        write(&root.join("local.properties"), "sdk.dir=/opt/sdk\n");
        write(&root.join("app/src/androidTest/java/Stale.java"), "old");
        write(
            &root.join("app/src/main/java/com/acme/app/MainActivity.java"),
            "package com.acme.app;\n",
        );
        write(
            &root.join("app/build.gradle"),
            "dependencies {\n    compile 'x:y:1'\n}\n",
        );

        let tests = dir.path().join("canonical");
        write(
            &tests.join("java/com/template/MainTest.java"),
            "package com.template;\nimport com.template.MainActivity;\nclass MainTest {}\n",
        );
        let project = AndroidProject::new("Alpha", root, "com.acme.app");
        (dir, project, tests)
    }

    #[test]
    fn prepares_every_step_and_writes_marker() {
        let (_dir, mut project, tests) = fixture();
        let config = BatchConfig::default();
        let ctx = PreparationContext {
            tests_dir: &tests,
            canonical_package: "com.template",
            config: &config,
        };
        let mut operator = ScriptedOperator::default();

        let report = prepare_project(&mut project, &ctx, &mut operator).unwrap();

        assert!(project.prepared);
        assert!(report.removed_local_properties);
        assert!(report.replaced_existing_tests);
        assert!(!project.path.join("local.properties").exists());
        assert!(!project.android_test_dir().join("java/Stale.java").exists());

        let test = fs::read_to_string(project.android_test_dir().join("java/com/template/MainTest.java")).unwrap();
        assert_eq!(
            test,
            "package com.template;\nimport com.acme.app.*;\nimport com.acme.app.MainActivity;\nclass MainTest {}\n"
        );
        assert_eq!(operator.pauses.len(), 1);

        let gradle = fs::read_to_string(project.build_script_path()).unwrap();
        assert_eq!(report.dependency_lines_inserted, 5);
        assert!(gradle.starts_with(
            "dependencies {\n    androidTestCompile 'com.android.support:support-annotations:25.1.0'\n"
        ));

        let marker = load_marker(&project.path).unwrap();
        assert_eq!(marker.package_name, "com.acme.app");
        assert!(is_marked_prepared(&project, &ctx));
    }

    #[test]
    fn prepared_project_is_left_untouched() {
        let (_dir, mut project, tests) = fixture();
        project.prepared = true;
        let config = BatchConfig::default();
        let ctx = PreparationContext {
            tests_dir: &tests,
            canonical_package: "com.template",
            config: &config,
        };
        let report = prepare_project(&mut project, &ctx, &mut ScriptedOperator::default()).unwrap();
        assert!(report.skipped);
        assert!(project.path.join("local.properties").exists());
        assert!(project.android_test_dir().join("java/Stale.java").exists());
    }

    #[test]
    fn missing_build_script_fails_without_marking() {
        let (_dir, mut project, tests) = fixture();
        fs::remove_file(project.build_script_path()).unwrap();
        let config = BatchConfig {
            review_pause: false,
            ..BatchConfig::default()
        };
        let ctx = PreparationContext {
            tests_dir: &tests,
            canonical_package: "com.template",
            config: &config,
        };
        let err = prepare_project(&mut project, &ctx, &mut ScriptedOperator::default()).unwrap_err();
        assert!(matches!(err, BatchError::FileSystem { .. }));
        assert!(!project.prepared);
        assert!(load_marker(&project.path).is_none());
    }

    fn write_marker_file(project: &AndroidProject, package: &str, tests: &Path, test_package: &str) {
        let marker = PreparationMarker {
            package_name: package.into(),
            canonical_tests: tests.to_path_buf(),
            test_package: test_package.into(),
            prepared_at: Utc::now(),
            tool_version: "0.0.0".into(),
        };
        write(&marker_path(&project.path), &serde_json::to_string(&marker).unwrap());
    }

    #[test]
    fn marker_for_another_package_does_not_count() {
        let (_dir, project, tests) = fixture();
        let config = BatchConfig::default();
        let ctx = PreparationContext {
            tests_dir: &tests,
            canonical_package: "com.template",
            config: &config,
        };
        write_marker_file(&project, "com.other", &tests, "com.template");
        assert!(!is_marked_prepared(&project, &ctx));
        write_marker_file(&project, "com.acme.app", &tests, "com.template");
        assert!(is_marked_prepared(&project, &ctx));
    }

    #[test]
    fn marker_for_other_canonical_tests_does_not_count() {
        let (_dir, project, tests) = fixture();
        let config = BatchConfig::default();
        let ctx = PreparationContext {
            tests_dir: &tests,
            canonical_package: "com.template",
            config: &config,
        };
        write_marker_file(&project, "com.acme.app", Path::new("/old/suite"), "com.template");
        assert!(!is_marked_prepared(&project, &ctx));
        write_marker_file(&project, "com.acme.app", &tests, "com.old.template");
        assert!(!is_marked_prepared(&project, &ctx));
    }
}
