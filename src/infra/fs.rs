//! # File System Operations Module / 文件系统操作模块
//!
//! Removal and copying of project files and trees, and enumeration of the
//! source files whose imports get rewritten.
//!
//! 项目文件和目录树的删除与复制，以及需要改写导入语句的源文件的枚举。

use fs_extra::dir::{copy, CopyOptions};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::{BatchError, BatchResult};

/// Removes a file, treating a missing file as success.
///
/// # Returns
/// `true` if a file was actually removed.
pub fn silent_remove(path: &Path) -> BatchResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BatchError::fs(path, e)),
    }
}

/// Recursively deletes a directory tree, treating a missing tree as success.
///
/// # Returns
/// `true` if a tree was actually removed.
pub fn remove_tree(path: &Path) -> BatchResult<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BatchError::fs(path, e)),
    }
}

/// Copies the directory `from` so that it becomes `to`.
/// `to` must not exist yet; its parent is created when needed.
///
/// 将目录 `from` 复制为 `to`。
/// `to` 必须尚不存在；必要时会创建其父目录。
///
/// # Arguments
/// * `from` - Source directory path
/// * `to` - Destination directory path, created by the copy
pub fn copy_tree(from: &Path, to: &Path) -> BatchResult<()> {
    let copy_error = |reason: String| BatchError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason,
    };

    if !is_directory(from) {
        return Err(copy_error("source tree is missing".to_string()));
    }
    if to.exists() {
        return Err(copy_error("destination already exists".to_string()));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| BatchError::fs(parent, e))?;
    }

    let mut options = CopyOptions::new();
    options.overwrite = false;
    options.copy_inside = true;
    copy(from, to, &options).map_err(|e| copy_error(e.to_string()))?;
    Ok(())
}

/// Lists every file under `root` with the given extension, sorted by path.
/// A missing `root` yields an empty list.
///
/// 列出 `root` 下所有具有给定扩展名的文件，按路径排序。
/// `root` 不存在时返回空列表。
pub fn list_source_files(root: &Path, extension: &str) -> BatchResult<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            BatchError::fs(path, io::Error::other(e.to_string()))
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Reads a UTF-8 text file, attaching the path to any error.
pub fn read_text(path: &Path) -> BatchResult<String> {
    fs::read_to_string(path).map_err(|e| BatchError::fs(path, e))
}

/// Writes a text file, attaching the path to any error.
pub fn write_text(path: &Path, content: &str) -> BatchResult<()> {
    fs::write(path, content).map_err(|e| BatchError::fs(path, e))
}
