//! # Configuration Initialization Module / 配置初始化模块
//!
//! Writes a `BatchTester.toml` through a short interactive wizard, or with the
//! defaults when run non-interactively.
//!
//! 通过简短的交互式向导写入 `BatchTester.toml`，非交互运行时写入默认值。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: asks for the dependency configuration, the build command and the review pause
//! - **Overwrite Protection**: confirmation prompt before replacing an existing file
//!
//! - **交互式向导**: 询问依赖配置、构建命令和审阅暂停
//! - **覆盖保护**: 替换现有文件前的确认提示

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::fs;
use std::path::Path;

use crate::core::config::BatchConfig;
use crate::infra::t;

/// Runs the interactive wizard and writes the resulting configuration to `config_path`.
///
/// 运行交互式向导并将生成的配置写入 `config_path`。
pub fn run_init_wizard(config_path: &Path, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut config = BatchConfig {
        language: rust_i18n::locale().to_string(),
        ..BatchConfig::default()
    };

    if non_interactive {
        return write_config(config_path, &config);
    }

    println!("\n{}", t!("init_wizard_welcome").cyan().bold());
    println!("{}", t!("init_wizard_description"));

    if config_path.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init_overwrite_prompt", path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init_user_confirmation_failed").to_string())?;
        if !confirmation {
            println!("{}", t!("init_aborted"));
            return Ok(());
        }
    }

    config.dependency_configuration = Input::with_theme(&theme)
        .with_prompt(t!("init_dependency_configuration_prompt"))
        .default(config.dependency_configuration.clone())
        .interact_text()
        .context(t!("init_user_confirmation_failed").to_string())?;
    config.build_command = Input::with_theme(&theme)
        .with_prompt(t!("init_build_command_prompt"))
        .default(config.build_command.clone())
        .interact_text()
        .context(t!("init_user_confirmation_failed").to_string())?;
    config.review_pause = Confirm::with_theme(&theme)
        .with_prompt(t!("init_review_pause_prompt"))
        .default(config.review_pause)
        .interact()
        .context(t!("init_user_confirmation_failed").to_string())?;

    config.validate()?;
    write_config(config_path, &config)
}

fn write_config(path: &Path, config: &BatchConfig) -> Result<()> {
    let toml_string =
        toml::to_string_pretty(config).context(t!("init_serialize_failed").to_string())?;

    fs::write(path, toml_string)
        .with_context(|| t!("init_write_failed", path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init_success_created", path = path.display()).bold()
    );
    println!("{}", t!("init_usage_hint"));

    Ok(())
}
