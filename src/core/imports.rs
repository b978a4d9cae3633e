//! # Import Rewriting Module / 导入语句改写模块
//!
//! The canonical tests were written against a template project. Before they
//! compile inside another project, the imports pointing at the template's
//! package are removed and imports for the project's own classes are added.
//!
//! Statements are recognised per line: a line is an import when, after leading
//! whitespace, it starts with the `import` keyword. Comments and string
//! literals that merely mention a package are left alone.
//!
//! 标准测试是针对模板项目编写的。在它们能在另一个项目中编译之前，
//! 需要删除指向模板包的导入，并添加项目自身类的导入。
//!
//! 语句按行识别：去掉前导空白后以 `import` 关键字开头的行即为导入语句。
//! 仅在注释或字符串字面量中提到包名的行保持不变。

use std::path::{Path, PathBuf};

use crate::core::models::relative_components;

/// Builds the import block for a project.
///
/// The first entry is always the wildcard import of `package_name`, followed by
/// one import per file in `main_sources`, in the given order. Files are named
/// by their path relative to `source_root`; files outside it are ignored.
///
/// 为项目构建导入块。
/// 第一项总是 `package_name` 的通配符导入，随后按给定顺序为 `main_sources`
/// 中的每个文件生成一条导入。文件按其相对于 `source_root` 的路径命名；
/// 不在其下的文件被忽略。
pub fn synthesize_imports(package_name: &str, source_root: &Path, main_sources: &[PathBuf]) -> Vec<String> {
    let mut imports = vec![format!("import {package_name}.*;")];
    for file in main_sources {
        let Some(mut parts) = relative_components(source_root, file) else {
            continue;
        };
        let Some(file_name) = parts.pop() else {
            continue;
        };
        let class_name = match file_name.rsplit_once('.') {
            Some((stem, _extension)) => stem.to_string(),
            None => file_name,
        };
        parts.push(class_name);
        let import = format!("import {};", parts.join("."));
        if !imports.contains(&import) {
            imports.push(import);
        }
    }
    imports
}

/// Name imported by an import statement, `None` for any other line.
///
/// `import static a.b.C.d;` yields `a.b.C.d`, `import a.b.*;` yields `a.b.*`.
pub fn imported_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let rest = match rest.strip_prefix("static") {
        Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
        _ => rest,
    };
    let name = rest.split(';').next()?.trim();
    if name.is_empty() { None } else { Some(name) }
}

/// `true` when the import statement on `line` refers to `package` or anything below it.
/// `package` 为空时永远不匹配。
pub fn imports_from_package(line: &str, package: &str) -> bool {
    if package.is_empty() {
        return false;
    }
    match imported_name(line) {
        Some(name) => {
            name == package
                || name
                    .strip_prefix(package)
                    .is_some_and(|rest| rest.starts_with('.'))
        }
        None => false,
    }
}

fn is_package_declaration(line: &str) -> bool {
    line.trim_start()
        .strip_prefix("package")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// Rewrites the text of one test source file.
///
/// 1. Import statements from `canonical_package` are removed. The first line
///    is never removed.
/// 2. `imports` are inserted right after the package declaration (at the top
///    when there is none), skipping any the file already contains verbatim.
///
/// Line endings of the original file are kept.
///
/// 改写一个测试源文件的文本：
/// 1. 删除来自 `canonical_package` 的导入语句，第一行永不删除。
/// 2. 在包声明之后（没有包声明时在文件顶部）插入 `imports`，跳过文件中已逐字存在的导入。
pub fn rewrite_test_source(content: &str, imports: &[String], canonical_package: &str) -> String {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let had_trailing_newline = content.ends_with('\n');

    let mut lines: Vec<&str> = content
        .lines()
        .enumerate()
        .filter(|(idx, line)| *idx == 0 || !imports_from_package(line, canonical_package))
        .map(|(_, line)| line)
        .collect();

    let existing: Vec<&str> = lines.iter().map(|line| line.trim()).collect();
    let missing: Vec<&str> = imports
        .iter()
        .map(String::as_str)
        .filter(|import| !existing.contains(import))
        .collect();

    let insert_at = lines
        .iter()
        .position(|line| is_package_declaration(line))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    lines.splice(insert_at..insert_at, missing);

    let mut rewritten = lines.join(newline);
    if had_trailing_newline || content.is_empty() {
        rewritten.push_str(newline);
    }
    rewritten
}
