//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// pyport - Tools around a portable Python installation.
#[derive(Debug, Parser)]
#[command(name = "pyport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Drive or folder holding the portable installation (defaults to the
    /// current directory)
    #[arg(long, global = true, env = "PYPORT_ROOT")]
    pub root: Option<PathBuf>,

    /// Interpreter executable or folder (overrides the settings file)
    #[arg(long, global = true, env = "PYPORT_PYTHON")]
    pub python: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Never prompt; answer from PYPORT_PROMPT_* variables or defaults
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the modules a script imports
    Imports(ScriptArgs),

    /// Show which imports of a script are missing
    Check(ScriptArgs),

    /// Install every missing import of a script
    InstallMissing(InstallMissingArgs),

    /// Install packages concurrently
    Install(InstallArgs),

    /// List installed packages
    List,

    /// List outdated packages
    Outdated,

    /// Upgrade outdated packages
    Upgrade(UpgradeArgs),

    /// Upgrade pip itself
    UpdatePip,

    /// Write the top-level requirements manifest
    Export(ExportArgs),

    /// Install packages from a requirements file
    ImportRequirements(ImportRequirementsArgs),

    /// Run a script, resolving missing imports first
    Run(RunArgs),

    /// Step through a script with pdb
    Debug(DebugArgs),

    /// Package a script as a standalone executable
    Build(BuildArgs),

    /// Back up the drive, skipping the portable installation
    Backup(BackupArgs),

    /// Write a launcher that opens a script with the portable interpreter
    Launcher(LauncherArgs),

    /// Save a snapshot of code
    Autosave(AutosaveArgs),

    /// Find text in a file
    Search(SearchArgs),

    /// Replace every occurrence of text in a file
    Replace(ReplaceArgs),

    /// Show or set the configured interpreter
    Interpreter(InterpreterArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// A single script argument.
#[derive(Debug, Clone, clap::Args)]
pub struct ScriptArgs {
    /// Python source file
    pub script: PathBuf,
}

/// Arguments for the `install-missing` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InstallMissingArgs {
    /// Python source file
    pub script: PathBuf,

    /// Cancel installs still running after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InstallArgs {
    /// Distribution names
    #[arg(required = true)]
    pub packages: Vec<String>,
}

/// Arguments for the `upgrade` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UpgradeArgs {
    /// Packages to upgrade (all outdated packages when omitted)
    pub packages: Vec<String>,
}

/// Arguments for the `export` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ExportArgs {
    /// Also write the manifest here
    #[arg(long, value_name = "FILE")]
    pub copy_to: Option<PathBuf>,
}

/// Arguments for the `import-requirements` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ImportRequirementsArgs {
    /// Requirements file (defaults to the exported manifest)
    pub file: Option<PathBuf>,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Python source file
    pub script: PathBuf,

    /// Do not install missing imports first
    #[arg(long)]
    pub no_resolve: bool,

    /// Arguments passed to the script
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Arguments for the `debug` command.
#[derive(Debug, Clone, clap::Args)]
pub struct DebugArgs {
    /// Python source file
    pub script: PathBuf,

    /// pdb commands to send instead of prompting (e.g. `-c n -c "p x" -c c`)
    #[arg(short, long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Seconds to wait for each pdb prompt
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    pub timeout: u64,
}

/// Arguments for the `build` command.
#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Python source file
    pub script: PathBuf,

    /// Name of the executable (defaults to the script's stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Folder the app folder is created in
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Arguments for the `backup` command.
#[derive(Debug, Clone, clap::Args)]
pub struct BackupArgs {
    /// Backup destination folder
    pub destination: PathBuf,

    /// Folder to leave out (defaults to the portable folder)
    #[arg(long, value_name = "NAME")]
    pub skip: Option<String>,

    /// Do not write requirements.txt into the backup
    #[arg(long)]
    pub no_requirements: bool,
}

/// Launcher flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LauncherKindArg {
    /// Windows Script Host (.vbs)
    Vbs,
    /// POSIX shell (.sh)
    Sh,
}

/// Arguments for the `launcher` command.
#[derive(Debug, Clone, clap::Args)]
pub struct LauncherArgs {
    /// Saved script the launcher opens
    pub script: PathBuf,

    /// Launcher flavour (defaults to the current platform's)
    #[arg(long, value_enum)]
    pub kind: Option<LauncherKindArg>,
}

/// Arguments for the `autosave` command.
#[derive(Debug, Clone, clap::Args)]
pub struct AutosaveArgs {
    /// File to read the code from (stdin when omitted or `-`)
    pub source: Option<PathBuf>,

    /// Overwrite this file instead of writing a new snapshot
    #[arg(long, value_name = "FILE")]
    pub current: Option<PathBuf>,
}

/// Arguments for the `search` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SearchArgs {
    /// File to search
    pub file: PathBuf,

    /// Literal text to find (case-insensitive)
    pub pattern: String,
}

/// Arguments for the `replace` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ReplaceArgs {
    /// File to edit in place
    pub file: PathBuf,

    /// Literal text to find (case-insensitive)
    pub pattern: String,

    /// Replacement text
    pub replacement: String,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `interpreter` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InterpreterArgs {
    #[command(subcommand)]
    pub action: InterpreterAction,
}

/// `interpreter` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum InterpreterAction {
    /// Print the interpreter that would be used
    Show,

    /// Check and save an interpreter folder or executable
    Set {
        /// Folder of the portable installation, or the executable
        path: PathBuf,
    },
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pyport", "list", "--root", "/drive", "-q"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/drive")));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn install_requires_a_package() {
        assert!(Cli::try_parse_from(["pyport", "install"]).is_err());
        let cli = Cli::try_parse_from(["pyport", "install", "numpy", "requests"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.packages, ["numpy", "requests"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn install_missing_takes_timeout() {
        let cli =
            Cli::try_parse_from(["pyport", "install-missing", "app.py", "--timeout", "30"])
                .unwrap();
        match cli.command {
            Commands::InstallMissing(args) => {
                assert_eq!(args.script, PathBuf::from("app.py"));
                assert_eq!(args.timeout, Some(30));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn run_passes_trailing_args() {
        let cli = Cli::try_parse_from(["pyport", "run", "app.py", "--", "-x", "1"]).unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.args, ["-x", "1"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn debug_collects_commands() {
        let cli =
            Cli::try_parse_from(["pyport", "debug", "app.py", "-c", "n", "-c", "p x"]).unwrap();
        match cli.command {
            Commands::Debug(args) => {
                assert_eq!(args.commands, ["n", "p x"]);
                assert_eq!(args.timeout, 10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn interpreter_set_takes_path() {
        let cli = Cli::try_parse_from(["pyport", "interpreter", "set", "/drive/PPython"]).unwrap();
        match cli.command {
            Commands::Interpreter(InterpreterArgs {
                action: InterpreterAction::Set { path },
            }) => assert_eq!(path, PathBuf::from("/drive/PPython")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["pyport", "list", "-v", "-q"]).is_err());
    }
}
