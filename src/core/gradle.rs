//! # Build Script Patching / 构建脚本修补
//!
//! Inserts the test-framework dependencies into a Groovy `build.gradle`.
//! Block structure is tracked by counting braces per line, which is enough to
//! tell the module's `dependencies { }` apart from the one nested in
//! `buildscript { }`.
//!
//! 将测试框架依赖插入 Groovy `build.gradle`。
//! 通过逐行计数大括号来跟踪块结构，足以区分模块的 `dependencies { }`
//! 和嵌套在 `buildscript { }` 中的那个。

/// Result of patching one build script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradlePatch {
    pub content: String,
    /// Number of `dependencies {` blocks that received lines.
    pub blocks_patched: usize,
    /// Number of lines inserted across all blocks.
    pub lines_inserted: usize,
}

fn opens_dependencies_block(line: &str) -> bool {
    line.trim()
        .strip_prefix("dependencies")
        .is_some_and(|rest| rest.trim_start().starts_with('{'))
}

fn opens_buildscript_block(line: &str) -> bool {
    line.trim()
        .strip_prefix("buildscript")
        .is_some_and(|rest| rest.trim_start().starts_with('{'))
}

fn brace_delta(line: &str) -> i32 {
    let code = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    code.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// `true` when `coordinate` already appears quoted anywhere in `content`.
pub fn declares_dependency(content: &str, coordinate: &str) -> bool {
    content.contains(&format!("'{coordinate}'")) || content.contains(&format!("\"{coordinate}\""))
}

/// Inserts `<configuration> '<coordinate>'` for every coordinate right after
/// each `dependencies {` line that is not inside `buildscript { }`. A block
/// that also closes on its opening line is split after the `{` first.
///
/// Coordinates the script already declares are skipped, so patching the same
/// script twice changes nothing the second time.
///
/// 在每个不位于 `buildscript { }` 内的 `dependencies {` 行之后，
/// 为每个坐标插入 `<configuration> '<coordinate>'`。
/// 脚本已经声明的坐标会被跳过，因此对同一脚本修补两次时第二次不会有任何变化。
pub fn patch_build_script(content: &str, configuration: &str, dependencies: &[String]) -> GradlePatch {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let missing: Vec<&String> = dependencies
        .iter()
        .filter(|coordinate| !declares_dependency(content, coordinate))
        .collect();

    let mut output: Vec<String> = Vec::new();
    let mut blocks_patched = 0;
    let mut lines_inserted = 0;
    let mut depth: i32 = 0;
    let mut buildscript_depth: Option<i32> = None;

    for line in content.lines() {
        if opens_buildscript_block(line) && buildscript_depth.is_none() {
            output.push(line.to_string());
            buildscript_depth = Some(depth);
        } else if opens_dependencies_block(line) && buildscript_depth.is_none() && !missing.is_empty() {
            let base = indentation(line);
            let indent = format!("{base}    ");
            // A block closed on its opening line is split after the `{`.
            let rest = match line.split_once('{') {
                Some((opener, rest)) if brace_delta(line) <= 0 => {
                    output.push(format!("{opener}{{"));
                    Some(rest.trim())
                }
                _ => {
                    output.push(line.to_string());
                    None
                }
            };
            for coordinate in &missing {
                output.push(format!("{indent}{configuration} '{coordinate}'"));
            }
            match rest {
                Some(rest) if rest.starts_with('}') => output.push(format!("{base}{rest}")),
                Some(rest) => output.push(format!("{indent}{rest}")),
                None => {}
            }
            blocks_patched += 1;
            lines_inserted += missing.len();
        } else {
            output.push(line.to_string());
        }

        depth += brace_delta(line);
        if buildscript_depth.is_some_and(|opened_at| depth <= opened_at) {
            buildscript_depth = None;
        }
    }

    let mut patched = output.join(newline);
    if content.ends_with('\n') {
        patched.push_str(newline);
    }
    GradlePatch {
        content: patched,
        blocks_patched,
        lines_inserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps() -> Vec<String> {
        vec![
            "com.android.support.test:runner:0.5".to_string(),
            "com.android.support.test:rules:0.5".to_string(),
        ]
    }

    const APP_SCRIPT: &str = r#"apply plugin: 'com.android.application'

android {
    compileSdkVersion 25
}

dependencies {
    compile 'com.android.support:appcompat-v7:25.1.0'
}
"#;

    #[test]
    fn inserts_each_dependency_right_after_the_block_opening() {
        let patch = patch_build_script(APP_SCRIPT, "androidTestCompile", &deps());
        let lines: Vec<&str> = patch.content.lines().collect();
        let open = lines.iter().position(|l| *l == "dependencies {").unwrap();
        assert_eq!(lines[open + 1], "    androidTestCompile 'com.android.support.test:runner:0.5'");
        assert_eq!(lines[open + 2], "    androidTestCompile 'com.android.support.test:rules:0.5'");
        assert_eq!(lines[open + 3], "    compile 'com.android.support:appcompat-v7:25.1.0'");
        for coordinate in deps() {
            assert_eq!(patch.content.matches(coordinate.as_str()).count(), 1);
        }
        assert_eq!(patch.blocks_patched, 1);
        assert_eq!(patch.lines_inserted, 2);
        assert!(patch.content.ends_with("}\n"));
    }

    #[test]
    fn patching_twice_does_not_duplicate() {
        let once = patch_build_script(APP_SCRIPT, "androidTestCompile", &deps());
        let twice = patch_build_script(&once.content, "androidTestCompile", &deps());
        assert_eq!(once.content, twice.content);
        assert_eq!(twice.lines_inserted, 0);
    }

    #[test]
    fn buildscript_dependencies_are_left_alone() {
        let script = r#"buildscript {
    repositories { jcenter() }
    dependencies {
        classpath 'com.android.tools.build:gradle:2.2.3'
    }
}
dependencies {
}
"#;
        let patch = patch_build_script(script, "androidTestCompile", &deps());
        assert_eq!(patch.blocks_patched, 1);
        let lines: Vec<&str> = patch.content.lines().collect();
        assert_eq!(lines[2], "    dependencies {");
        assert_eq!(lines[3], "        classpath 'com.android.tools.build:gradle:2.2.3'");
        assert_eq!(lines[6], "dependencies {");
        assert_eq!(lines[7], "    androidTestCompile 'com.android.support.test:runner:0.5'");
    }

    #[test]
    fn script_without_dependencies_block_is_unchanged() {
        let script = "apply plugin: 'com.android.application'\n";
        let patch = patch_build_script(script, "androidTestCompile", &deps());
        assert_eq!(patch.content, script);
        assert_eq!(patch.blocks_patched, 0);
    }

    #[test]
    fn single_line_block_is_split_open() {
        let script = "dependencies { compile 'x:y:1' }\n";
        let deps = vec!["a:b:1".to_string()];
        let patch = patch_build_script(script, "androidTestCompile", &deps);
        assert_eq!(
            patch.content,
            "dependencies {\n    androidTestCompile 'a:b:1'\n    compile 'x:y:1' }\n"
        );
    }

    #[test]
    fn empty_single_line_block_is_split_open() {
        let script = "android {}\n  dependencies {}\n";
        let deps = vec!["a:b:1".to_string()];
        let patch = patch_build_script(script, "androidTestCompile", &deps);
        assert_eq!(
            patch.content,
            "android {}\n  dependencies {\n      androidTestCompile 'a:b:1'\n  }\n"
        );
    }

    #[test]
    fn already_declared_coordinates_are_skipped() {
        let script = "dependencies {\n    androidTestCompile \"com.android.support.test:runner:0.5\"\n}\n";
        let patch = patch_build_script(script, "androidTestCompile", &deps());
        assert_eq!(patch.lines_inserted, 1);
        assert_eq!(patch.content.matches("runner:0.5").count(), 1);
        assert_eq!(patch.content.matches("rules:0.5").count(), 1);
    }
}
