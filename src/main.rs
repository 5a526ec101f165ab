//! barbarian CLI - publish conan recipes to a git branch

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use barbarian::ops::{self, CiService, NewOptions, RecipeLayout};
use barbarian::{ensure_branch, push_branch, ConanRemote, Error, Repo};

#[derive(Parser)]
#[command(name = "barbarian")]
#[command(about = "publish conan recipes to a git branch recipe repository")]
#[command(version)]
struct Cli {
    /// conan remote to register uploads with, as <url>@<name>
    #[arg(long, global = true, env = "BARBARIAN_REMOTE")]
    remote: Option<ConanRemote>,

    /// repository path
    #[arg(short, long, global = true, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// export a recipe into the repository-local conan cache
    Export {
        /// recipe directory or conanfile.py
        path: PathBuf,

        /// package reference, e.g. zlib/1.3@ or @user/channel
        #[arg(default_value = "@")]
        reference: String,
    },

    /// publish an exported recipe to the upload branch
    Upload {
        /// package reference, e.g. zlib/1.3@
        reference: String,
    },

    /// manage the upload branch
    Branch {
        #[arg(value_enum)]
        action: BranchAction,
    },

    /// scaffold a new recipe
    New {
        /// package reference, e.g. zlib/1.3@
        reference: String,

        /// recipe layout
        #[arg(long, value_enum, default_value = "standalone")]
        recipe: RecipeLayout,

        /// generate a header-only recipe
        #[arg(long)]
        header_only: bool,

        /// generate continuous integration configuration
        #[arg(long, value_enum)]
        ci: Option<CiService>,

        /// replace existing files
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BranchAction {
    /// create the upload branch if it does not exist
    Create,
    /// push the upload branch to the remote
    Push,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if is_informational(e.kind()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// help and version requests go through clap's error path but are not failures
fn is_informational(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn open(path: &Path, remote: Option<ConanRemote>) -> barbarian::Result<Repo> {
    let mut repo = Repo::discover(path)?;
    if remote.is_some() {
        repo.config_mut().conan_remote = remote;
    }
    Ok(repo)
}

fn run(cli: Cli) -> barbarian::Result<()> {
    match cli.command {
        Commands::Export { path, reference } => {
            let repo = open(&path, cli.remote)?;
            let result = ops::export(&repo, &path, &reference)?;
            println!("{}", result.coordinate);
        }

        Commands::Upload { reference } => {
            let repo = open(&cli.repo, cli.remote)?;
            let result = ops::upload(&repo, &reference)?;
            println!("{}", result.latest.revision);
        }

        Commands::Branch { action } => {
            let repo = open(&cli.repo, cli.remote)?;
            match action {
                BranchAction::Create => {
                    let origin = ensure_branch(&repo)?;
                    println!("{} ({:?})", repo.config().branch, origin);
                }
                BranchAction::Push => push_branch(&repo)?,
            }
        }

        Commands::New {
            reference,
            recipe,
            header_only,
            ci,
            overwrite,
        } => {
            // scaffolding works outside a repository too
            let (root, configured) = match open(&cli.repo, cli.remote.clone()) {
                Ok(repo) => (repo.root().to_path_buf(), repo.config().conan_remote.clone()),
                Err(Error::NoRepo(_)) => (cli.repo.clone(), cli.remote),
                Err(e) => return Err(e),
            };

            let options = NewOptions {
                layout: recipe,
                header_only,
                ci,
                overwrite,
                conan_remotes: configured.map(|r| format!("{}@{}", r.url, r.name)),
            };
            for path in ops::new_recipe(&root, &reference, &options)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(args: &[&str]) -> ErrorKind {
        match Cli::try_parse_from(args) {
            Ok(_) => panic!("{:?} parsed", args),
            Err(e) => e.kind(),
        }
    }

    #[test]
    fn test_usage_errors_fail() {
        assert!(!is_informational(parse_error(&["barbarian", "bogus"])));
        assert!(!is_informational(parse_error(&["barbarian", "upload"])));
        assert!(!is_informational(parse_error(&[
            "barbarian",
            "--remote",
            "no-name-here",
            "branch",
            "push",
        ])));
    }

    #[test]
    fn test_help_and_version_succeed() {
        assert!(is_informational(parse_error(&["barbarian", "--help"])));
        assert!(is_informational(parse_error(&["barbarian", "--version"])));
    }

    #[test]
    fn test_parse_new() {
        let cli = Cli::try_parse_from([
            "barbarian",
            "new",
            "zlib/1.3@",
            "--recipe",
            "collection",
            "--ci",
            "github",
        ])
        .unwrap();
        match cli.command {
            Commands::New { recipe, ci, .. } => {
                assert_eq!(recipe, RecipeLayout::Collection);
                assert_eq!(ci, Some(CiService::Github));
            }
            _ => panic!("expected new"),
        }
    }
}
