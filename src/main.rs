//! Medscribe - multi-agent medical text assistant
//!
//! Main entry point for the CLI application.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use medscribe::agent::{AgentManager, PipelineRequest, PipelineRunner};
use medscribe::cli::commands::{progress_printer, render_run};
use medscribe::core::logging::{init_logging, parse_level, LogFormat};
use medscribe::{Config, ProviderType, Repl};

/// Medscribe - summarize, write and sanitize medical text with chained agents
#[derive(Parser, Debug)]
#[command(name = "medscribe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model provider (ollama or openai)
    #[arg(long, global = true)]
    provider: Option<ProviderType>,

    /// Model name
    #[arg(long, short = 'm', global = true)]
    model: Option<String>,

    /// Provider base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Retries after a failed model call
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Disable per-attempt tracing
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true, env = "LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize medical text and validate the summary
    Summarize(TextInput),
    /// Write a research article, refine it and validate it
    Write {
        /// Article topic
        #[arg(long, short = 't')]
        topic: String,
        /// Optional outline
        #[arg(long, short = 'o')]
        outline: Option<String>,
    },
    /// Remove PHI from medical data and validate the result
    Sanitize(TextInput),
    /// Show the default configuration or save the current one
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct TextInput {
    /// Input text
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read input from a file
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,
}

impl TextInput {
    fn read(self) -> anyhow::Result<String> {
        match (self.text, self.file) {
            (Some(text), _) => Ok(text),
            (None, Some(path)) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => anyhow::bail!("Provide --text or --file"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;

    if let Some(provider) = args.provider {
        config.provider.kind = provider;
    }
    if let Some(ref model) = args.model {
        config.provider.model = model.clone();
    }
    if let Some(ref base_url) = args.base_url {
        config.provider.base_url = base_url.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.agents.max_retries = max_retries;
    }
    if args.quiet {
        config.agents.verbose = false;
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = args.log_format {
        config.logging.format = format.clone();
    }

    config.validate()?;
    init_logging(
        parse_level(&config.logging.level),
        LogFormat::parse(&config.logging.format),
    );

    let request = match args.command {
        None => {
            let mut repl = Repl::with_config(config)?;
            repl.run().await?;
            return Ok(());
        }
        Some(Command::Config { init }) => {
            if init {
                let path = config.save_and_get_path()?;
                println!("Wrote {}", path.display());
            } else {
                println!("# {}", Config::config_file().display());
                println!("{}", Config::default_config_toml());
            }
            return Ok(());
        }
        Some(Command::Summarize(input)) => PipelineRequest::Summarize { text: input.read()? },
        Some(Command::Write { topic, outline }) => {
            PipelineRequest::WriteAndRefine { topic, outline }
        }
        Some(Command::Sanitize(input)) => PipelineRequest::Sanitize {
            medical_data: input.read()?,
        },
    };

    let manager = AgentManager::from_config(&config)?;
    let runner = PipelineRunner::new(&manager).with_progress(progress_printer());
    let run = runner.run(&request).await?;

    print!("{}", render_run(&run));
    if !run.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
