// mailtrace CLI - match a mailing list against CRM leads by location

mod commands;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use mailtrace_matcher::{DatasetKind, MatchError};

use exit_codes::{match_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "mailtrace")]
#[command(about = "Match mailed addresses against CRM leads and report acquisition KPIs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a mail CSV against a CRM CSV
    #[command(after_help = "\
Examples:
  mailtrace run mail.csv crm.csv
  mailtrace run mail.csv crm.csv --output results.csv
  mailtrace run mail.csv crm.csv --json
  mailtrace run mail.csv crm.csv --config mailtrace.toml --kpis kpis.json")]
    Run {
        /// Mailing list CSV
        mail: PathBuf,

        /// CRM / lead list CSV
        crm: PathBuf,

        /// Matcher config (TOML)
        #[arg(long, env = "MAILTRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Write matched rows as CSV
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full outcome as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the KPI summary as JSON
        #[arg(long)]
        kpis: Option<PathBuf>,

        /// Exit non-zero when nothing matched
        #[arg(long)]
        fail_on_no_match: bool,
    },

    /// Show which column each field resolves to in a CSV
    #[command(after_help = "\
Examples:
  mailtrace inspect mail.csv --kind mail
  mailtrace inspect leads.csv --kind crm --json")]
    Inspect {
        /// CSV file to inspect
        file: PathBuf,

        /// Which side of the match this file is
        #[arg(long)]
        kind: KindArg,

        /// Matcher config (TOML)
        #[arg(long, env = "MAILTRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Output JSON instead of a text listing
        #[arg(long)]
        json: bool,
    },

    /// Validate a matcher config without running
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Mail,
    Crm,
}

impl From<KindArg> for DatasetKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Mail => DatasetKind::Mail,
            KindArg::Crm => DatasetKind::Crm,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  mailtrace-matcher ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            mail,
            crm,
            config,
            output,
            json,
            kpis,
            fail_on_no_match,
        } => commands::cmd_run(commands::RunArgs {
            mail,
            crm,
            config,
            output,
            json,
            kpis,
            fail_on_no_match,
        }),
        Commands::Inspect { file, kind, config, json } => {
            commands::cmd_inspect(file, kind.into(), config, json)
        }
        Commands::Validate { config } => commands::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MatchError> for CliError {
    fn from(err: MatchError) -> Self {
        let code = match_exit_code(&err);
        let hint = match &err {
            MatchError::SchemaFieldMissing { .. } => Some(
                "rename the column to one of the aliases above, or add an alias under \
                 [aliases.mail] / [aliases.crm] in a --config file"
                    .to_string(),
            ),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
