use anyhow::Result;
use clap::{Parser, Subcommand};
use intl_extract::commands;
use intl_extract::config::ExtractionConfig;
use intl_extract::logging::{self, Verbosity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intl-extract")]
#[command(author, version, about = "Extracts react-intl message descriptors into per-file JSON manifests", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Per-file detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract message descriptors from source files
    Extract {
        /// Input glob patterns (overrides config)
        #[arg(short, long)]
        input: Vec<String>,

        /// Glob patterns excluded from extraction (overrides config)
        #[arg(long)]
        ignore: Vec<String>,

        /// Manifest output directory (overrides config)
        #[arg(short, long)]
        messages_dir: Option<PathBuf>,

        /// Import source to match against (overrides config)
        #[arg(long)]
        module_source_name: Option<String>,

        /// Downgrade extraction errors to warnings
        #[arg(long)]
        errors_as_warnings: bool,

        /// Permit descriptors without a defaultMessage
        #[arg(long)]
        optional_default_messages: bool,

        /// Require a description on every descriptor
        #[arg(long)]
        enforce_descriptions: bool,

        /// Attach {file, line, column} to each descriptor
        #[arg(long)]
        extract_source_location: bool,

        /// Apply source rewrites in place
        #[arg(long)]
        write: bool,

        /// Fail on warnings
        #[arg(long)]
        fail_on_warnings: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    let mut config = ExtractionConfig::load_or_default(cli.config.as_ref())?;

    match cli.command {
        Commands::Extract {
            input,
            ignore,
            messages_dir,
            module_source_name,
            errors_as_warnings,
            optional_default_messages,
            enforce_descriptions,
            extract_source_location,
            write,
            fail_on_warnings,
        } => {
            if !input.is_empty() {
                config.input = input;
            }
            if !ignore.is_empty() {
                config.ignore = ignore;
            }
            if let Some(dir) = messages_dir {
                config.messages_dir = Some(dir);
            }
            if let Some(source) = module_source_name {
                config.module_source_name = source;
            }
            config.errors_as_warnings |= errors_as_warnings;
            config.optional_default_messages |= optional_default_messages;
            config.enforce_descriptions |= enforce_descriptions;
            config.extract_source_location |= extract_source_location;

            commands::extract::run(&config, write, fail_on_warnings)?;
        }
    }

    Ok(())
}
