use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shufflepick::{
    config, picker::shuffle_picks, Pick, Picker, ShuffleStore, Source, SourceReader,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Pick one random, non-repeating row at a time from a CSV/TXT file or a published sheet"
)]
struct Args {
    /// Directory holding the persisted full and working sets.
    #[arg(long, env = "SHUFFLEPICK_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Config file with `sheets.public.url`. Defaults to `<data-dir>/config.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where to read rows from; the configured default sheet when neither is set.
#[derive(clap::Args)]
struct SourceArgs {
    /// Sheet export URL; overrides the configured default.
    #[arg(long)]
    url: Option<String>,
    /// Local .csv or .txt file to read instead of a sheet.
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch fresh rows and replace both the full and working sets.
    Load {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Hand out the next row, or reset once the working set runs out.
    Pick,
    /// Show how many rows are left.
    Status,
    /// Print every row of a source without its header.
    List {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print a source's rows in a random order with a countdown.
    Shuffle {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── logging to stderr; stdout carries results ────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config::default_path(&args.data_dir));

    match args.command {
        Command::Load { source } => {
            let source = resolve(&source, &config_path)?;
            let rows = SourceReader::new()
                .read(&source)
                .await
                .with_context(|| format!("reading {}", source))?;
            let picker = open_picker(&args.data_dir)?;
            let n = picker.load(&rows).context("saving rows")?;
            println!("loaded {} rows from {}", n, source);
        }
        Command::Pick => {
            let picker = open_picker(&args.data_dir)?;
            match picker.pick().context("picking next row")? {
                Pick::Item(item) => println!("{}", serde_json::to_string(&item)?),
                Pick::Reset => {
                    info!("working set refilled");
                    println!("restarting");
                }
            }
        }
        Command::Status => {
            let picker = open_picker(&args.data_dir)?;
            let remaining = picker.remaining().context("reading working set")?;
            let total = picker.total().context("reading full set")?;
            println!("{}/{} remaining in {}", remaining, total, picker.store().dir().display());
        }
        Command::List { source } => {
            let source = resolve(&source, &config_path)?;
            let values = SourceReader::new()
                .read_values(&source)
                .await
                .with_context(|| format!("reading {}", source))?;
            for line in values {
                println!("{}", line);
            }
        }
        Command::Shuffle { source, seed } => {
            let source = resolve(&source, &config_path)?;
            let values = SourceReader::new()
                .read_values(&source)
                .await
                .with_context(|| format!("reading {}", source))?;
            for pick in shuffle_picks(values, seed) {
                println!("{}/{} {}", pick.remaining, pick.total, pick.item);
            }
        }
    }

    Ok(())
}

fn resolve(args: &SourceArgs, config_path: &Path) -> Result<Source> {
    Source::resolve(args.url.as_deref(), args.file.as_deref(), config_path)
        .context("resolving source")
}

fn open_picker(data_dir: &Path) -> Result<Picker> {
    let store = ShuffleStore::new(data_dir)
        .with_context(|| format!("opening store in {}", data_dir.display()))?;
    Ok(Picker::new(Arc::new(store)))
}
