//! Command-line front end
//!
//! ```bash
//! paper-decoded summarize paper.pdf --output paper.md
//! paper-decoded serve --config paper-decoded.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use paper_decoded::{config::RagConfig, server::PaperServer, SectionKind, Session};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Turn a research paper PDF into a blog-style summary
#[derive(Parser, Debug)]
#[command(name = "paper-decoded", version, about)]
struct Cli {
    /// TOML configuration file (defaults to $PAPER_DECODED_CONFIG)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "paper_decoded=warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize one PDF and print the markdown
    Summarize {
        /// The paper to summarize
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Write the markdown here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Run the HTTP server
    Serve,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn summarize(config: RagConfig, pdf: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let mut session = Session::from_config(config).context("Failed to set up providers")?;

    let pb = spinner();
    let info = session
        .ingest(&pdf, |step| pb.set_message(step.message()))
        .await;
    let info = match info {
        Ok(info) => info,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("Failed to process {}", pdf.display()));
        }
    };
    pb.println(format!(
        "{} {} ({} pages, {} chunks)",
        style("Indexed").green().bold(),
        info.filename,
        info.page_count,
        info.chunk_count
    ));

    let mut next = SectionKind::ALL.iter();
    if let Some(kind) = next.next() {
        pb.set_message(format!("Writing {}...", kind.title()));
    }
    let result = session
        .summarize(|section| {
            pb.println(format!("{} {}", style("✓").green(), section.title));
            if let Some(kind) = next.next() {
                pb.set_message(format!("Writing {}...", kind.title()));
            }
        })
        .await;
    pb.finish_and_clear();

    let markdown = session.summary().to_markdown(Some(&info.filename));
    if let Err(e) = result {
        if !session.summary().is_empty() {
            println!("{}", markdown);
        }
        return Err(e).context("Summary generation failed");
    }

    match output {
        Some(path) => {
            std::fs::write(&path, &markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", style("Saved").green().bold(), path.display());
        }
        None => println!("{}", markdown),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = RagConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Summarize { pdf, output } => summarize(config, pdf, output).await,
        Command::Serve => {
            let server = PaperServer::new(config)?;
            eprintln!("Listening on http://{}", server.address());
            server.start().await?;
            Ok(())
        }
    }
}
