//! mapbars CLI - inspect data files and open the viewer.

use anyhow::{Context, Result};
use mapbars::data::loader::{self, LoadedData};
use mapbars::data::DataProxy;
use mapbars::render::{AreaSpecs, RenderItemCache};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    // The viewer installs its own loggers
    if !matches!(filtered_args.first().copied(), Some("view" | "v")) {
        init_logging(level);
    }

    let result = match filtered_args.first().copied() {
        None => {
            print_usage(&args[0]);
            Ok(())
        }
        Some("info" | "i") => match filtered_args.get(1) {
            Some(path) => cmd_info(Path::new(path)),
            None => {
                eprintln!("Usage: {} info <file>", args[0]);
                std::process::exit(1);
            }
        },
        Some("demo" | "d") => {
            print_info("built-in rainfall demo", &loader::demo_rainfall());
            Ok(())
        }
        Some("view" | "v") => cmd_view(filtered_args.get(1).map(PathBuf::from)),
        Some("help" | "h" | "-h" | "--help") => {
            print_usage(&args[0]);
            Ok(())
        }
        Some(other) => {
            // Assume it's a file path
            if Path::new(other).exists() {
                cmd_info(Path::new(other))
            } else {
                eprintln!("Unknown command: {}", other);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn print_usage(prog: &str) {
    println!(
        "mapbars {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("MAPBARS_BUILD_DATE"),
        env!("MAPBARS_BUILD_TIME")
    );
    println!();
    println!("Usage: {} [options] <command> [file]", prog);
    println!();
    println!("Commands:");
    println!("  i, info <file>   Show grid statistics and value limits");
    println!("  d, demo          Show statistics of the built-in demo data");
    println!("  v, view [file]   Open the viewer");
    println!("  h, help          Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Errors only");
}

fn cmd_info(path: &Path) -> Result<()> {
    tracing::info!("Loading data: {}", path.display());
    let data = loader::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    print_info(&path.display().to_string(), &data);
    Ok(())
}

fn print_info(name: &str, data: &LoadedData) {
    let grid = &data.grid;
    let rows = grid.row_count();
    let present = grid.rows().iter().filter(|r| r.is_some()).count();
    let items: usize = grid.rows().iter().flatten().map(Vec::len).sum();
    let columns = grid.rows().iter().flatten().map(Vec::len).max().unwrap_or(0);
    let limits = grid.limits();

    println!("Data: {}", name);
    println!("  Rows:     {} ({} present)", rows, present);
    println!("  Columns:  {}", columns);
    println!("  Items:    {}", items);
    if data.skipped > 0 {
        println!("  Skipped:  {} invalid lines", data.skipped);
    }
    println!("  Area:     {} x {}", data.area.x, data.area.y);
    println!();
    println!("Limits:");
    println!("  Min:        {}", limits.min);
    println!("  Max:        {}", limits.max);
    println!("  Normalizer: {}", limits.height_normalizer());
    println!("  Y adjust:   {}", limits.y_adjustment());

    // Derive render items the way the viewer would, to report exclusions
    let mut cache = RenderItemCache::new(AreaSpecs::new(data.area.x, data.area.y));
    cache.handle_event(&mapbars::data::GridEvent::Reset, grid);
    match cache.rebuild_if_dirty(grid) {
        Ok(_) => {
            let drawable = cache.drawable().count();
            println!();
            println!("Render items: {} ({} drawable)", cache.items().len(), drawable);
        }
        Err(e) => println!("Render items: {}", e),
    }
}

#[cfg(feature = "viewer")]
fn cmd_view(file: Option<PathBuf>) -> Result<()> {
    mapbars::viewer::run(file)
}

#[cfg(not(feature = "viewer"))]
fn cmd_view(_file: Option<PathBuf>) -> Result<()> {
    anyhow::bail!("this build has no viewer; rebuild with the \"viewer\" feature")
}
