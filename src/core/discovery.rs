//! # Project Discovery Module / 项目发现模块
//!
//! Scans the projects root for Android projects and reads each one's package
//! name from the root `<manifest>` element of its `AndroidManifest.xml`.
//!
//! 扫描项目根目录中的 Android 项目，并从其 `AndroidManifest.xml`
//! 的根 `<manifest>` 元素读取包名。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::error::{BatchError, BatchResult};
use crate::core::models::{AndroidProject, Candidate, RejectedProject, APP_DIR, MANIFEST_PATH};
use crate::infra::fs::{is_directory, read_text};

/// Ordered result of scanning a projects root.
/// 扫描项目根目录得到的有序结果。
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<Candidate>,
}

impl Discovery {
    /// Projects that can be prepared and tested.
    pub fn projects(&self) -> impl Iterator<Item = &AndroidProject> {
        self.candidates.iter().filter_map(|c| match c {
            Candidate::Ready(project) => Some(project),
            Candidate::Rejected(_) => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = &RejectedProject> {
        self.candidates.iter().filter_map(|c| match c {
            Candidate::Rejected(rejected) => Some(rejected),
            Candidate::Ready(_) => None,
        })
    }
}

/// Scans the immediate subdirectories of `root`, in file-name order.
///
/// Subdirectories without an `app` module or without a manifest are skipped.
/// A malformed manifest does not stop the scan; the subdirectory is kept as a
/// rejected candidate so it shows up in the report.
///
/// 按文件名顺序扫描 `root` 的直接子目录。
/// 没有 `app` 模块或没有清单文件的子目录会被跳过。
/// 清单文件格式错误不会中止扫描；该子目录作为被拒绝的候选保留，以便出现在报告中。
///
/// # Errors
/// `BatchError::Configuration` if `root` is not an existing directory.
pub fn discover_projects(root: &Path) -> BatchResult<Discovery> {
    if !is_directory(root) {
        return Err(BatchError::Configuration(format!(
            "projects root {} is not an existing directory",
            root.display()
        )));
    }

    let mut directories: Vec<(String, PathBuf)> = fs::read_dir(root)
        .map_err(|e| BatchError::fs(root, e))?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let Some(title) = entry.file_name().to_str().map(str::to_string) else {
                debug!(dir = %entry.path().display(), "directory name is not UTF-8, skipping");
                return None;
            };
            Some((title, entry.path()))
        })
        .collect();
    directories.sort_by(|a, b| a.0.cmp(&b.0));

    let mut discovery = Discovery::default();
    for (title, path) in directories {
        if !is_directory(&path.join(APP_DIR)) {
            debug!(project = %title, "no app module, skipping");
            continue;
        }
        let manifest_path = path.join(MANIFEST_PATH);
        if !manifest_path.is_file() {
            warn!(project = %title, "app module has no {MANIFEST_PATH}, skipping");
            continue;
        }

        let candidate = match read_text(&manifest_path)
            .and_then(|text| parse_package_name(&text, &manifest_path))
        {
            Ok(package_name) => {
                debug!(project = %title, package = %package_name, "discovered project");
                Candidate::Ready(AndroidProject::new(title, path, package_name))
            }
            Err(error) => {
                warn!(project = %title, %error, "rejecting project");
                Candidate::Rejected(RejectedProject { title, path, error })
            }
        };
        discovery.candidates.push(candidate);
    }
    Ok(discovery)
}

/// Extracts the `package` attribute of the root `<manifest>` element.
///
/// 提取根 `<manifest>` 元素的 `package` 属性。
///
/// # Errors
/// `BatchError::MalformedManifest` when the XML cannot be read, the root element
/// is not `<manifest>`, or the attribute is missing or not a dotted identifier.
pub fn parse_package_name(manifest: &str, path: &Path) -> BatchResult<String> {
    let malformed = |reason: String| BatchError::MalformedManifest {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = Reader::from_str(manifest);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return package_attribute(&element).map_err(malformed);
            }
            Ok(Event::Eof) => return Err(malformed("no root element".to_string())),
            Ok(_) => {}
            Err(e) => {
                return Err(malformed(format!(
                    "invalid XML at position {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }
}

fn package_attribute(element: &BytesStart<'_>) -> Result<String, String> {
    if element.name().as_ref() != b"manifest" {
        return Err(format!(
            "root element is <{}>, expected <manifest>",
            String::from_utf8_lossy(element.name().as_ref())
        ));
    }
    let attribute = element
        .try_get_attribute("package")
        .map_err(|e| format!("unreadable attributes: {e}"))?
        .ok_or_else(|| "missing package attribute".to_string())?;
    let value = attribute
        .unescape_value()
        .map_err(|e| format!("unreadable package attribute: {e}"))?;
    let package_name = value.trim();
    if !is_dotted_identifier(package_name) {
        return Err(format!("package attribute `{package_name}` is not a package name"));
    }
    Ok(package_name.to_string())
}

fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}
