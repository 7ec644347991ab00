use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser as _;
use lognorm::config::Overrides;
use lognorm::driver::{self, Summary};
use lognorm::ParserConfig;
use tokio::io::BufReader;

#[derive(clap::Parser)]
#[command(name = "lognorm", about = "Normalise access logs into JSON records")]
struct Cli {
    /// TOML config file layered over the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `caddy`, a preset (common, combined, …) or a `$placeholder` format.
    #[arg(long)]
    format: Option<String>,

    /// Timestamp encoding for `caddy`: unix_seconds_float, unix_milli_float,
    /// unix_nano, or a layout.
    #[arg(long)]
    datetime_format: Option<String>,

    /// Layout for `$date`.
    #[arg(long)]
    date: Option<String>,

    /// Layout for `$time`.
    #[arg(long)]
    time: Option<String>,

    /// Layout for `$datetime`.
    #[arg(long)]
    datetime: Option<String>,

    /// Drop lines matching `[!]field:[glob:|re:]pattern`. Repeatable.
    #[arg(long)]
    exclude: Vec<String>,

    /// Log debug diagnostics to stderr.
    #[arg(long)]
    debug: bool,

    /// Input files; stdin when none are given.
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let overrides = Overrides {
        format: cli.format,
        datetime_format: cli.datetime_format,
        date: cli.date,
        time: cli.time,
        datetime: cli.datetime,
        exclude: cli.exclude,
    };
    let config = ParserConfig::load(cli.config.as_deref(), &overrides)
        .context("loading configuration")?;
    let parser = config.build().context("building parser")?;

    let mut stdout = tokio::io::stdout();
    let mut total = Summary::default();
    if cli.files.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        total += driver::normalize(&parser, "<stdin>", stdin, &mut stdout).await?;
    } else {
        for path in &cli.files {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            let source = path.display().to_string();
            total += driver::normalize(&parser, &source, BufReader::new(file), &mut stdout).await?;
        }
    }

    tracing::info!(
        emitted = total.emitted,
        skipped = total.skipped,
        failed = total.failed,
        bad_timestamps = total.bad_timestamps,
        "done"
    );
    Ok(())
}
