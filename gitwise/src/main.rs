//! gitwise: describe a git workflow in plain words and run it step by step.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use gitwise::exit_codes;
use gitwise::io::config::{CONFIG_ENV, GitwiseConfig, load_config, resolve_config_path, write_config};
use gitwise::io::terminal::{Prompter, TerminalPrompter};
use gitwise::logging;
use gitwise::session::{Session, render_help};
use gitwise::steps::builtin_registry;

#[derive(Parser)]
#[command(
    name = "gitwise",
    version,
    about = "Natural-language git workflows with step-by-step confirmation",
    disable_help_subcommand = true
)]
struct Cli {
    /// Config file (default: $GITWISE_CONFIG or <repo>/.gitwise/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository to operate on.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// What you want to do, e.g. "commit and push my work".
    request: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a request; asks for it when none is given.
    Interactive {
        request: Vec<String>,
    },
    /// List the available steps and the answers each prompt accepts.
    Help,
    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as TOML.
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the config file location.
    Path,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::OK,
                _ => exit_codes::INVALID,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = config_path(&cli);
    match cli.command {
        Some(Command::Help) => cmd_help(),
        Some(Command::Config { action }) => cmd_config(action, &config_path),
        Some(Command::Interactive { request }) => cmd_run(&request, &cli.repo, &config_path),
        None => cmd_run(&cli.request, &cli.repo, &config_path),
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    let env_value = std::env::var(CONFIG_ENV).ok();
    resolve_config_path(cli.config.as_deref(), env_value.as_deref(), &cli.repo)
}

fn cmd_help() -> Result<i32> {
    let registry = builtin_registry()?;
    print!("{}", render_help(&registry.catalog()));
    Ok(exit_codes::OK)
}

fn cmd_config(action: ConfigAction, path: &Path) -> Result<i32> {
    match action {
        ConfigAction::Show => {
            let cfg = load_config(path)?;
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config toml")?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            write_config(path, &GitwiseConfig::default())?;
            println!("wrote {}", path.display());
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(exit_codes::OK)
}

fn cmd_run(words: &[String], repo: &Path, config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let mut session = Session::new(config, repo, |key| std::env::var(key).ok())?;

    let stdin = io::stdin();
    let mut prompter = TerminalPrompter::new(stdin.lock(), io::stdout());

    let mut request = words.join(" ");
    if request.trim().is_empty() {
        request = prompter.ask("What would you like to do?", None)?;
    }
    if request.trim().is_empty() {
        bail!("no request given (try `gitwise help`)");
    }

    let report = session.run(request.trim(), &mut prompter)?;
    prompter
        .into_output()
        .flush()
        .context("flush stdout")?;
    Ok(exit_codes::for_outcome(report.outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_without_subcommand() {
        let cli = Cli::parse_from(["gitwise", "commit", "my", "work"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.request, vec!["commit", "my", "work"]);
    }

    #[test]
    fn parse_interactive_with_text() {
        let cli = Cli::parse_from(["gitwise", "interactive", "push", "it"]);
        match cli.command {
            Some(Command::Interactive { request }) => assert_eq!(request, vec!["push", "it"]),
            _ => panic!("expected interactive"),
        }
    }

    #[test]
    fn parse_help_is_the_domain_command() {
        let cli = Cli::parse_from(["gitwise", "help"]);
        assert!(matches!(cli.command, Some(Command::Help)));
    }

    #[test]
    fn parse_config_init_force_and_globals() {
        let cli = Cli::parse_from(["gitwise", "config", "init", "--force", "--repo", "/tmp/r", "-v"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Init { force: true }
            })
        ));
        assert_eq!(cli.repo, PathBuf::from("/tmp/r"));
        assert!(cli.verbose);
    }
}
