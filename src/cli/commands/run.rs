//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: resolve the three batch inputs,
//! discover the projects, drive them through the runner and write the report.
//!
//! 此模块实现 `run` 命令：确定三个批量输入、发现项目、通过运行器驱动它们并写入报告。

use anyhow::{bail, Context, Result};
use colored::*;
use std::env;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::warn;

use crate::{
    core::{
        config::{self, BatchConfig},
        discovery::discover_projects,
        error::BatchError,
        execution::BatchRunner,
        preparation::PreparationContext,
    },
    infra::{
        command::GradleWrapper,
        fs::is_directory,
        prompt::{ask_directory, ask_non_empty, ConsoleOperator, LineOperator, Operator, Unattended},
        t,
    },
    reporting::{print_summary, write_report},
};

/// Comment recorded for a failed project when nobody is there to grade it.
pub const UNATTENDED_GRADE: &str = "Build failed (unattended run)";

/// Arguments of the `run` command, after clap.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub tests_dir: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
    pub test_package: Option<String>,
    pub config: PathBuf,
    /// The config path was given explicitly, so it must exist.
    pub config_required: bool,
    pub non_interactive: bool,
    pub reprepare: bool,
    pub no_review: bool,
    pub lang: Option<String>,
}

/// Batch inputs after command line, config file and prompts were merged.
/// 合并命令行、配置文件和提示之后的批量输入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInputs {
    pub tests_dir: PathBuf,
    pub projects_dir: PathBuf,
    pub test_package: String,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// `true` when every project passed.
pub async fn execute(args: RunArgs) -> Result<bool> {
    let mut config = config::load_config(&args.config, args.config_required)
        .with_context(|| t!("config_load_failed", path = args.config.display()).to_string())?;
    // `--lang` was applied before parsing; otherwise a config file picks the language.
    if args.config.exists() {
        if args.lang.is_none() {
            rust_i18n::set_locale(&crate::resolve_locale(Some(&config.language)));
        }
        println!("{}", t!("loading_config", path = args.config.display()));
    }
    if args.no_review || args.non_interactive {
        config.review_pause = false;
    }
    warn_without_sdk();

    let mut operator = make_operator(args.non_interactive);
    let inputs = resolve_inputs(&args, &config, operator.as_mut())?;

    let tests_dir = fs::canonicalize(&inputs.tests_dir)
        .with_context(|| t!("path_resolve_failed", path = inputs.tests_dir.display()).to_string())?;
    let projects_dir = fs::canonicalize(&inputs.projects_dir)
        .with_context(|| t!("path_resolve_failed", path = inputs.projects_dir.display()).to_string())?;

    let discovery = discover_projects(&projects_dir)?;
    let ready = discovery.projects().count();
    println!(
        "{}",
        t!("projects_found", count = ready, path = projects_dir.display()).cyan()
    );
    if discovery.candidates.is_empty() {
        println!("{}", t!("no_projects_found").yellow());
    }

    let build_tool = GradleWrapper::new(config.build_command_parts()?, config.capture_build_output)?;
    let ctx = PreparationContext {
        tests_dir: &tests_dir,
        canonical_package: &inputs.test_package,
        config: &config,
    };
    let outcomes = BatchRunner::new(ctx, operator.as_mut(), &build_tool)
        .reprepare(args.reprepare)
        .run(discovery)
        .await;

    let report_path = write_report(&projects_dir, &config.report_file_name, &outcomes)
        .context(t!("report_write_failed").to_string())?;
    print_summary(&outcomes);
    println!("\n{}", t!("report_written", path = report_path.display()).bold());

    Ok(outcomes.iter().all(|outcome| outcome.is_passed()))
}

fn make_operator(non_interactive: bool) -> Box<dyn Operator> {
    if non_interactive {
        Box::new(Unattended::new(UNATTENDED_GRADE))
    } else if io::stdin().is_terminal() {
        Box::new(ConsoleOperator::default())
    } else {
        Box::new(LineOperator::new(io::stdin().lock(), io::stdout()))
    }
}

fn warn_without_sdk() {
    if env::var_os("ANDROID_HOME").is_none() && env::var_os("ANDROID_SDK_ROOT").is_none() {
        warn!("neither ANDROID_HOME nor ANDROID_SDK_ROOT is set");
        println!("{}", t!("android_home_missing").yellow());
    }
}

/// Merges the three batch inputs: command line first, then config file, then
/// prompts. Prompts are only used when `args.non_interactive` is false.
///
/// 合并三个批量输入：先命令行，再配置文件，最后提示。仅当 `args.non_interactive` 为 false 时使用提示。
///
/// # Errors
/// A path given on the command line or in the config that is not a directory
/// aborts instead of re-prompting. So does a missing input in non-interactive mode.
pub fn resolve_inputs<O: Operator + ?Sized>(
    args: &RunArgs,
    config: &BatchConfig,
    operator: &mut O,
) -> Result<BatchInputs> {
    let tests_dir = resolve_directory(
        args.tests_dir.as_ref().or(config.tests_dir.as_ref()),
        "TESTS_DIR",
        args.non_interactive,
        operator,
        &t!("prompt_tests_dir"),
    )?;
    let projects_dir = resolve_directory(
        args.projects_dir.as_ref().or(config.projects_dir.as_ref()),
        "PROJECTS_DIR",
        args.non_interactive,
        operator,
        &t!("prompt_projects_dir"),
    )?;

    let given_package = args
        .test_package
        .as_deref()
        .or(config.test_package.as_deref())
        .map(str::trim)
        .filter(|package| !package.is_empty());
    let test_package = match given_package {
        Some(package) => package.to_string(),
        None if args.non_interactive => bail!(missing_input("TEST_PACKAGE")),
        None => ask_non_empty(operator, &t!("prompt_test_package"), &t!("empty_answer"))
            .context(t!("operator_input_failed").to_string())?,
    };

    Ok(BatchInputs {
        tests_dir,
        projects_dir,
        test_package,
    })
}

fn missing_input(name: &str) -> BatchError {
    BatchError::Configuration(t!("missing_input", name = name).to_string())
}

fn resolve_directory<O: Operator + ?Sized>(
    given: Option<&PathBuf>,
    name: &str,
    non_interactive: bool,
    operator: &mut O,
    prompt: &str,
) -> Result<PathBuf> {
    match given {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string());
            if !is_directory(&path) {
                bail!(BatchError::Configuration(
                    t!("invalid_directory_path", path = path.display()).to_string()
                ));
            }
            Ok(path)
        }
        None if non_interactive => bail!(missing_input(name)),
        None => ask_directory(operator, prompt, &t!("invalid_directory"))
            .context(t!("operator_input_failed").to_string()),
    }
}
