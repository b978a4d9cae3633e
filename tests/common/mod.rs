// Shared Android project fixtures for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const CANONICAL_PACKAGE: &str = "com.template.app";

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Creates `<root>/<title>` as a minimal Android Studio project for `package`.
pub fn create_android_project(root: &Path, title: &str, package: &str) -> PathBuf {
    let project = root.join(title);
    write(
        &project.join("app/src/main/AndroidManifest.xml"),
        &format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{package}">
    <application android:label="{title}" />
</manifest>
"#
        ),
    );
    let package_dir = package.replace('.', "/");
    write(
        &project.join(format!("app/src/main/java/{package_dir}/MainActivity.java")),
        &format!("package {package};\n\npublic class MainActivity {{}}\n"),
    );
    write(
        &project.join("app/build.gradle"),
        r#"apply plugin: 'com.android.application'

dependencies {
    compile fileTree(dir: 'libs', include: ['*.jar'])
}
"#,
    );
    write(&project.join("local.properties"), "sdk.dir=/home/student/Android/Sdk\n");
    project
}

/// Installs a `gradlew` that ignores its arguments and exits with `code`.
#[cfg(unix)]
pub fn install_fake_gradlew(project: &Path, code: i32) {
    use std::os::unix::fs::PermissionsExt;

    let script = project.join("gradlew");
    fs::write(&script, format!("#!/bin/sh\necho \"fake gradle $@\"\nexit {code}\n")).unwrap();
    let mut permissions = fs::metadata(&script).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&script, permissions).unwrap();
}

/// Creates the canonical `androidTest` tree written against [`CANONICAL_PACKAGE`].
pub fn create_canonical_tests(root: &Path) -> PathBuf {
    let tests = root.join("androidTest");
    write(
        &tests.join("java/com/template/app/MainActivityTest.java"),
        r#"package com.template.app;

import android.support.test.rule.ActivityTestRule;
import com.template.app.MainActivity;
import org.junit.Rule;

public class MainActivityTest {
    @Rule
    public ActivityTestRule<MainActivity> rule = new ActivityTestRule<>(MainActivity.class);
}
"#,
    );
    tests
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
