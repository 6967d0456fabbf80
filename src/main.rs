//! Headless runner (default binary).
//!
//! Plays one bot-driven game and prints the final stats. Logging goes
//! through `env_logger`; set `RUST_LOG=info` (or `debug` for every spawn
//! and lock) to follow the game.

use anyhow::Result;

use line_clear::config::EngineConfig;
use line_clear::driver::{self, parse_run_args, USAGE};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let run_args = parse_run_args(&args)?;
    if run_args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = EngineConfig::from_env();
    let report = driver::run(&config, &run_args)?;

    println!(
        "seed={} pieces={} score={} lines={} level={}{}",
        report.seed,
        report.pieces,
        report.stats.score,
        report.stats.lines,
        report.stats.level,
        if report.game_over { " (game over)" } else { "" }
    );
    if let Some(path) = report.saved {
        println!("saved to {}", path.display());
    }
    Ok(())
}
