//! manhwa-scout CLI - scrape manga/manhwa sites and import series.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manhwa_scout::chapters::DiscoveryStrategy;
use manhwa_scout::config::Config;
use manhwa_scout::console::Console;
use manhwa_scout::fetcher::HttpFetcher;
use manhwa_scout::import::ChapterSpan;
use manhwa_scout::model::format_number;
use manhwa_scout::server::{self, AppState};
use manhwa_scout::store::JsonDirStore;
use manhwa_scout::{catalog, logging, reader};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Scrape manga/manhwa sites, detect chapters and import series.
#[derive(Parser, Debug)]
#[command(name = "manhwa-scout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a series page and print its metadata.
    Scrape {
        url: String,
        /// Print the full record as JSON.
        #[arg(long)]
        json: bool,
        /// List every chapter.
        #[arg(long)]
        chapters: bool,
    },
    /// Preview a series the way the import bot does.
    Preview { url: String },
    /// Import a series with a synthetic chapter range.
    Import {
        url: String,
        /// First chapter (defaults to the first detected chapter).
        #[arg(long)]
        from: Option<u32>,
        /// Last chapter (defaults to the last detected chapter).
        #[arg(long)]
        to: Option<u32>,
    },
    /// Report the chapter numbering of a series page.
    Detect { url: String },
    /// List the page images of a chapter.
    Pages {
        url: String,
        /// Print relay URLs instead of the originals.
        #[arg(long)]
        relay: bool,
    },
    /// List the series linked from a homepage.
    Catalog { url: String },
    /// Import every series listed on a homepage.
    Batch {
        homepage: String,
        /// Maximum number of series to process.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run the HTTP server.
    Serve {
        /// Bind address (overrides `server.addr`).
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let config = load_config(args.config.as_ref())?;
    logging::init(args.verbose || config.scraping.debug)?;

    let fetcher = HttpFetcher::new(&config.scraping).context("Failed to build HTTP client")?;
    let client = fetcher.client().clone();
    let store_dir = config.store_dir().context("Failed to resolve store directory")?;
    let state = AppState::new(
        &config,
        Arc::new(fetcher),
        client,
        Arc::new(JsonDirStore::new(&store_dir)),
    );

    match args.command {
        Command::Scrape { url, json, chapters } => {
            let series = state
                .scraper
                .scrape(&url)
                .await
                .context("Failed to scrape series")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
                return Ok(());
            }

            console.section(&series.title);
            console.field("Status", &console.status(series.status));
            console.field("Type", &format!("{:?}", series.kind));
            console.field("Genres", &series.genres.join(", "));
            console.field("Author", series.author.as_deref().unwrap_or_default());
            console.field("Artist", series.artist.as_deref().unwrap_or_default());
            console.field("Cover", &series.thumbnail_url);
            console.field(
                "Chapters",
                &format!(
                    "{} ({})",
                    console.count(series.chapters.len()),
                    console.range(&series.range, series.chapters.len())
                ),
            );
            if !series.description.is_empty() {
                println!();
                println!("{}", series.description);
            }

            if chapters {
                println!();
                for chapter in series.newest_first() {
                    println!("{}", console.chapter_line(&chapter));
                }
            }
        }

        Command::Preview { url } => {
            let preview = state
                .importer
                .preview(&url)
                .await
                .context("Failed to preview series")?;

            console.section(&preview.title);
            console.field("Cover", &preview.thumbnail);
            console.field("Chapters", &console.count(preview.total_chapters));
            console.field(
                "Range",
                &format!(
                    "{}-{}",
                    format_number(preview.range_start),
                    format_number(preview.range_end)
                ),
            );
            println!();
            println!("{}", preview.description);
        }

        Command::Import { url, from, to } => {
            console.step(&format!("Importing {}", url));
            let span = (from.is_some() || to.is_some()).then_some(ChapterSpan { from, to });
            let summary = state
                .importer
                .import(&url, span)
                .await
                .context("Failed to import series")?;

            console.success(&summary.message);
            console.info(&format!(
                "Stored as {} (chapters {})",
                summary.series_id, summary.range
            ));
            console.info(&console.muted(&format!("Store: {}", store_dir.display())));
        }

        Command::Detect { url } => {
            let report = state
                .scraper
                .detect(&url)
                .await
                .context("Failed to detect chapters")?;

            if report.strategy == DiscoveryStrategy::Empty {
                console.warning("No chapter links found");
            }
            console.field("Base URL", &report.base_url);
            console.field("Pattern", &report.chapter_url_pattern);
            console.field("First", &format_number(report.first_chapter));
            console.field("Last", &format_number(report.last_chapter));
            console.field("Total", &console.count(report.total_chapters));
            console.field("Strategy", &format!("{:?}", report.strategy));
        }

        Command::Pages { url, relay } => {
            let rewriter = if relay { state.rewriter.as_ref() } else { None };
            let pages = reader::scrape_chapter_pages(state.scraper.transport(), &url, rewriter)
                .await
                .context("Failed to scrape chapter pages")?;

            if pages.images.is_empty() {
                console.warning("No page images found");
            }
            for image in &pages.images {
                println!("{}", image);
            }
        }

        Command::Catalog { url } => {
            let entries = catalog::scrape_catalog(state.scraper.transport(), &url)
                .await
                .context("Failed to scrape catalog")?;

            console.success(&format!("Found {} series", console.count(entries.len())));
            for entry in &entries {
                println!("{:<40} {}", entry.title, console.muted(&entry.url));
            }
        }

        Command::Batch { homepage, limit } => {
            console.step(&format!("Importing series listed on {}", homepage));
            let report = state
                .importer
                .import_catalog(&homepage, limit)
                .await
                .context("Batch import failed")?;

            console.success(&format!(
                "Processed {} of {}: {} imported, {} skipped, {} failed",
                report.processed, report.total, report.imported, report.skipped, report.failed
            ));
            for error in &report.errors {
                console.error(error);
            }
        }

        Command::Serve { addr } => {
            let addr = match addr {
                Some(addr) => addr,
                None => config
                    .server
                    .addr
                    .parse::<SocketAddr>()
                    .context("Invalid server.addr")?,
            };
            console.info(&format!("Listening on http://{}", addr));
            server::serve(addr, state).await?;
        }
    }

    Ok(())
}
