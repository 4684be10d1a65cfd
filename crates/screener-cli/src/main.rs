//! Fundamentals screener CLI.
//!
//! Commands:
//! - `screen` — run the watchlist through retrieval, metrics and grading,
//!   then print the ranked table
//! - `cache evict` — drop cached snapshots older than the lifetime
//! - `cache clear` — drop every cached snapshot

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use screener::{
    parse_watchlist, MetricResult, ScreenResult, Screener, ScreenerConfig, SnapshotCache,
    SnapshotLoader, YahooProvider, DEFAULT_WATCHLIST,
};
use screener_cache::{DiskCache, NoopCache, SqliteCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "screener", about = "Fundamentals screener for a stock watchlist")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a watchlist and print the ranked result table.
    Screen {
        /// Tickers to screen. Defaults to the built-in watchlist.
        tickers: Vec<String>,

        /// Cache backend.
        #[arg(long, value_enum, default_value_t = Backend::Disk)]
        backend: Backend,

        /// Cache location (directory for disk, database file for sqlite).
        #[arg(long, default_value = "stock_cache")]
        cache_dir: PathBuf,

        /// Snapshot lifetime in hours before a re-fetch.
        #[arg(long, default_value_t = 24)]
        ttl_hours: u64,

        /// Skip the randomized pause before provider requests.
        #[arg(long, default_value_t = false)]
        no_delay: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove cached snapshots older than the lifetime.
    Evict {
        /// Cache backend.
        #[arg(long, value_enum, default_value_t = Backend::Disk)]
        backend: Backend,

        /// Cache location (directory for disk, database file for sqlite).
        #[arg(long, default_value = "stock_cache")]
        cache_dir: PathBuf,

        /// Snapshot lifetime in hours.
        #[arg(long, default_value_t = 24)]
        ttl_hours: u64,
    },
    /// Remove every cached snapshot.
    Clear {
        /// Cache backend.
        #[arg(long, value_enum, default_value_t = Backend::Disk)]
        backend: Backend,

        /// Cache location (directory for disk, database file for sqlite).
        #[arg(long, default_value = "stock_cache")]
        cache_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// One JSON file per ticker in a cache directory.
    Disk,
    /// Single SQLite database file.
    Sqlite,
    /// No caching at all.
    None,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            tickers,
            backend,
            cache_dir,
            ttl_hours,
            no_delay,
        } => run_screen(tickers, backend, &cache_dir, ttl_hours, no_delay).await,
        Commands::Cache { action } => match action {
            CacheAction::Evict {
                backend,
                cache_dir,
                ttl_hours,
            } => run_cache_evict(backend, &cache_dir, ttl_hours).await,
            CacheAction::Clear { backend, cache_dir } => {
                run_cache_clear(backend, &cache_dir).await
            }
        },
    }
}

fn open_cache(backend: Backend, location: &Path) -> Result<Arc<dyn SnapshotCache>> {
    Ok(match backend {
        Backend::Disk => Arc::new(DiskCache::new(location)?),
        Backend::Sqlite => Arc::new(SqliteCache::new(location)?),
        Backend::None => Arc::new(NoopCache::new()),
    })
}

async fn run_screen(
    tickers: Vec<String>,
    backend: Backend,
    cache_dir: &Path,
    ttl_hours: u64,
    no_delay: bool,
) -> Result<()> {
    let watchlist = if tickers.is_empty() {
        parse_watchlist(DEFAULT_WATCHLIST.iter().copied())
    } else {
        parse_watchlist(tickers)
    };

    let mut config =
        ScreenerConfig::new().with_cache_ttl(Duration::from_secs(ttl_hours * 3600));
    if no_delay {
        config = config.without_delay();
    }

    let loader = SnapshotLoader::new(
        Arc::new(YahooProvider::new()),
        open_cache(backend, cache_dir)?,
        config,
    );

    let results = Screener::new(loader).screen(&watchlist).await;

    if results.is_empty() {
        eprintln!("No tickers produced a result.");
        std::process::exit(1);
    }

    print_table(&results);

    let dropped = watchlist.len() - results.len();
    if dropped > 0 {
        eprintln!("{dropped} ticker(s) failed and were dropped; see log output.");
    }

    Ok(())
}

async fn run_cache_evict(backend: Backend, cache_dir: &Path, ttl_hours: u64) -> Result<()> {
    let cache = open_cache(backend, cache_dir)?;
    let removed = cache
        .invalidate_stale(Duration::from_secs(ttl_hours * 3600))
        .await?;
    println!("Removed {removed} expired snapshot(s).");
    Ok(())
}

async fn run_cache_clear(backend: Backend, cache_dir: &Path) -> Result<()> {
    let cache = open_cache(backend, cache_dir)?;
    cache.clear().await?;
    println!("Cache cleared.");
    Ok(())
}

fn print_table(results: &[ScreenResult]) {
    print!("{}", render_table(results));
}

/// One row per ticker: the plain metric columns, then each graded ratio as
/// `value (grade)`, then the composite grade.
fn render_table(results: &[ScreenResult]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<7} {:>8} {:>8} {:>6} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9} {:>6}",
        "Ticker", "KGV", "KGV-Adj", "Div", "GW_YOY", "GW_FY", "LONG_GW", "GWK-YOY", "GWK-FY",
        "GWK-LT", "KP-YOY", "KP-FY", "KP-LT", "PEG", "Grade"
    );
    let _ = writeln!(out, "{}", "-".repeat(142));

    for row in results {
        let m = &row.metrics;
        let g = &row.grades;
        let _ = writeln!(
            out,
            "{:<7} {:>8} {:>8} {:>6} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9} {:>6}",
            row.symbol.as_str(),
            fmt_metric(&m.kgv),
            fmt_metric(&m.kgv_adj),
            fmt_opt(m.dividend_rate),
            fmt_metric(&m.gw_yoy),
            fmt_metric(&m.gw_fy),
            fmt_metric(&m.long_gw),
            fmt_graded(&m.gw_kgv_yoy, g.gw_kgv_yoy),
            fmt_graded(&m.gw_kgv_fy, g.gw_kgv_fy),
            fmt_graded(&m.gw_kgv_long, g.gw_kgv_long),
            fmt_graded(&m.kgv_pro_yoy, g.kgv_pro_yoy),
            fmt_graded(&m.kgv_pro_fy, g.kgv_pro_fy),
            fmt_graded(&m.kgv_pro_long, g.kgv_pro_long),
            fmt_graded(&m.peg, g.peg),
            fmt_grade(g.composite),
        );
    }
    out
}

fn fmt_metric(value: &MetricResult) -> String {
    match value {
        Ok(v) => format!("{v:.2}"),
        Err(_) => "-".to_string(),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn fmt_graded(value: &MetricResult, grade: Option<u8>) -> String {
    match (value, grade) {
        (Ok(v), Some(g)) => format!("{v:.2} ({g})"),
        (Ok(v), None) => format!("{v:.2} (-)"),
        (Err(_), _) => "-".to_string(),
    }
}

fn fmt_grade(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |g| format!("{g:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener::{DerivedMetrics, GradeSheet, MetricGap, Symbol};

    fn sample_row() -> ScreenResult {
        ScreenResult {
            symbol: Symbol::new("ACME"),
            metrics: DerivedMetrics {
                kgv: Ok(20.0),
                kgv_adj: Err(MetricGap::MissingField),
                gw_yoy: Err(MetricGap::MissingField),
                gw_fy: Ok(33.33),
                long_gw: Ok(25.99),
                peg: Ok(0.6),
                dividend_rate: Some(0.96),
                gw_kgv_yoy: Err(MetricGap::MissingField),
                gw_kgv_fy: Ok(1.67),
                gw_kgv_long: Ok(1.3),
                kgv_pro_yoy: Err(MetricGap::MissingField),
                kgv_pro_fy: Ok(1.72),
                kgv_pro_long: Ok(1.35),
            },
            grades: GradeSheet {
                gw_kgv_fy: Some(3),
                gw_kgv_long: Some(4),
                kgv_pro_fy: Some(2),
                kgv_pro_long: Some(4),
                peg: Some(1),
                composite: Some(2.8),
                ..GradeSheet::default()
            },
        }
    }

    #[test]
    fn table_pairs_each_ratio_with_its_grade() {
        let rendered = render_table(&[sample_row()]);

        assert!(rendered.contains("1.67 (3)"));
        assert!(rendered.contains("1.72 (2)"));
        assert!(rendered.contains("0.60 (1)"));
        assert!(rendered.contains("2.80"));
    }

    #[test]
    fn table_carries_every_metric_column() {
        let rendered = render_table(&[sample_row()]);
        let header = rendered.lines().next().unwrap();

        for column in [
            "Ticker", "KGV", "KGV-Adj", "Div", "GW_YOY", "GW_FY", "LONG_GW", "GWK-YOY", "GWK-FY",
            "GWK-LT", "KP-YOY", "KP-FY", "KP-LT", "PEG", "Grade",
        ] {
            assert!(header.contains(column), "missing column {column}");
        }
        assert!(rendered.contains("0.96"));
    }

    #[test]
    fn ungraded_fields_render_as_dashes() {
        let rendered = render_table(&[sample_row()]);
        let row = rendered.lines().nth(2).unwrap();

        // Missing KGV-Adj and the YoY dimensions show plain dashes, never a
        // fabricated grade.
        assert!(row.contains(" - "));
        assert!(!row.contains("(6)"));
    }
}
