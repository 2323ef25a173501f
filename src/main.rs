mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use skein_grammar::dump::parse_dump;
use skein_grammar::{TokenStream, compile};
use skein_types::Story;

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "skein", version, about = "Compile branching narrative scripts")]
struct Cli {
    /// Configuration file to use instead of `skein.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Raise log verbosity; repeat for more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a token dump and print the story graph as JSON.
    Compile {
        /// Token dump, one `line:col kind "space" "text"` entry per line.
        tokens: PathBuf,
        /// Label of the entry node.
        #[arg(long)]
        start: Option<String>,
        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },
    /// Compile a token dump and only report diagnostics.
    Check {
        tokens: PathBuf,
        /// Label of the entry node.
        #[arg(long)]
        start: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (path, start, pretty, emit) = match cli.command {
        Command::Compile {
            tokens,
            start,
            pretty,
        } => (tokens, start, pretty, true),
        Command::Check { tokens, start } => (tokens, start, false, false),
    };
    let settings = Settings::load(cli.config.as_deref(), start, pretty)
        .wrap_err("failed to load settings")?;
    init_logging(&settings.log_level, cli.verbose);
    log::debug!("{settings:?}");

    let story = compile_file(&path, &settings)?;
    for diagnostic in story.diagnostics() {
        eprintln!("{}:{diagnostic}", path.display());
    }
    if emit {
        let json = if settings.pretty {
            serde_json::to_string_pretty(&story)?
        } else {
            serde_json::to_string(&story)?
        };
        println!("{json}");
    }

    if settings.deny_diagnostics && !story.diagnostics().is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_logging(level: &str, verbose: u8) {
    let level = match verbose {
        0 => level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn compile_file(path: &Path, settings: &Settings) -> Result<Story> {
    let input = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let tokens =
        parse_dump(&input).wrap_err_with(|| format!("malformed token dump {}", path.display()))?;
    log::info!("{}: {} tokens", path.display(), tokens.len());
    let story = compile(TokenStream::new(tokens), &settings.compile_options())
        .wrap_err_with(|| format!("failed to compile {}", path.display()))?;
    log::info!(
        "{}: {} nodes, {} diagnostics",
        path.display(),
        story.len(),
        story.diagnostics().len()
    );
    Ok(story)
}
