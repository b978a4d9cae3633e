// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::infra::t;

pub mod commands {
    pub mod init;
    pub mod run;
}

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

pub fn build_cli() -> Command {
    Command::new("android-batch-tester")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about").to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about").to_string())
                .arg(
                    Arg::new("tests-dir")
                        .help(t!("arg_tests_dir").to_string())
                        .value_name("TESTS_DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .index(1),
                )
                .arg(
                    Arg::new("projects-dir")
                        .help(t!("arg_projects_dir").to_string())
                        .value_name("PROJECTS_DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .index(2),
                )
                .arg(
                    Arg::new("test-package")
                        .help(t!("arg_test_package").to_string())
                        .value_name("TEST_PACKAGE")
                        .index(3),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config").to_string())
                        .value_name("CONFIG")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive").to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("reprepare")
                        .long("reprepare")
                        .help(t!("arg_reprepare").to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-review")
                        .long("no-review")
                        .help(t!("arg_no_review").to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about").to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_init_non_interactive").to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn run_args(matches: &ArgMatches) -> commands::run::RunArgs {
    let explicit_config = matches.get_one::<PathBuf>("config").cloned();
    commands::run::RunArgs {
        tests_dir: matches.get_one::<PathBuf>("tests-dir").cloned(),
        projects_dir: matches.get_one::<PathBuf>("projects-dir").cloned(),
        test_package: matches.get_one::<String>("test-package").cloned(),
        config_required: explicit_config.is_some(),
        config: explicit_config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        non_interactive: matches.get_flag("non-interactive"),
        reprepare: matches.get_flag("reprepare"),
        no_review: matches.get_flag("no-review"),
        lang: matches.get_one::<String>("lang").cloned(),
    }
}

/// Parses the command line and runs the chosen command.
///
/// # Returns
/// `true` when the command succeeded completely (for `run`: every project passed).
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    rust_i18n::set_locale(&crate::resolve_locale(requested.as_deref()));

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => commands::run::execute(run_args(run_matches)).await,
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::run_init_wizard(std::path::Path::new(DEFAULT_CONFIG_FILE), non_interactive)?;
            Ok(true)
        }
        // Clap has already printed help, since a subcommand is required.
        _ => Ok(true),
    }
}
