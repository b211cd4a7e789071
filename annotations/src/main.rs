// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use annotations::cli;
use annotations::config::AnnotationsConfig;
use annotations::store::AnnotationStore;
use annotations::util::log_level_changer::{build_logger, default_rules, init_logger};
use annotations::workspace::FsWorkspace;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <workspace> and -P <project>, or run 'annotations help'.");
            return 2;
        }
    };

    let (project, tokens) = match parsed_args.mode {
        RunMode::Help => {
            print!("{}", cli::help_text());
            return 0;
        }
        RunMode::Cli { project, tokens } => (project, tokens),
    };

    let config = match AnnotationsConfig::load(&parsed_args.workspace_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            return 1;
        }
    };

    if let Err(error) = init_logger(default_rules(), build_logger(config.log_level())) {
        eprintln!("❌ Failed to initialize logging: {}", error);
    }
    debug!(
        "Workspace {} project '{}'",
        parsed_args.workspace_root.display(),
        project
    );

    let workspace = Arc::new(FsWorkspace::new(
        &parsed_args.workspace_root,
        &config.settings_folder,
    ));
    let store = AnnotationStore::new(config, workspace);
    let exit_code = cli::run_cli(&store, &project, &tokens);
    store.shutdown();
    exit_code
}

enum RunMode {
    Cli { project: String, tokens: Vec<String> },
    Help,
}

struct ParsedArgs {
    workspace_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            workspace_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut workspace_root = PathBuf::from(".");
    let mut project = None;
    let mut cli_tokens = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            workspace_root = PathBuf::from(value);
        } else if arg == "-P" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -P".to_string())?;
            project = Some(value);
        } else {
            cli_tokens.push(arg);
        }
    }

    if cli_tokens.is_empty()
        || (cli_tokens.len() == 1 && cli_tokens[0].eq_ignore_ascii_case("help"))
    {
        return Ok(ParsedArgs {
            workspace_root,
            mode: RunMode::Help,
        });
    }

    let project = project.ok_or_else(|| "Missing -P <project>".to_string())?;
    let workspace_root = make_workspace_root_absolute(workspace_root)?;

    Ok(ParsedArgs {
        workspace_root,
        mode: RunMode::Cli {
            project,
            tokens: cli_tokens,
        },
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_workspace_root_absolute(path: PathBuf) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path);
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| format!("Failed to resolve current directory: {}", error))
}
