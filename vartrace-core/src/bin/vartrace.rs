//! vartrace CLI - trace a variable through a physics suite
//!
//! Lists, in call order, which schemes of a suite declare a variable and with
//! which intent.
//!
//! Usage:
//!     vartrace -s suite_FV3_GFS.xml -m physics/ -c ccpp_prebuild_config.json -v surface_air_pressure
//!     vartrace ... --debug
//!     vartrace ... --json

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vartrace_core::{run, TrackConfig, TrackReport};

#[derive(Parser, Debug)]
#[command(name = "vartrace")]
#[command(about = "Trace which schemes of a suite read and write a variable")]
#[command(version)]
struct Args {
    /// Suite definition file to use
    #[arg(short, long)]
    sdf: PathBuf,

    /// Directory holding the scheme metadata (.meta) files
    #[arg(short, long)]
    metadata_path: PathBuf,

    /// Prebuild configuration file (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Standard name of the variable to trace
    #[arg(short, long)]
    variable: String,

    /// Enable debugging output (added on top of RUST_LOG)
    #[arg(long)]
    debug: bool,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    init_logging(args.debug);

    let config = TrackConfig::new(args.sdf, args.metadata_path, args.config, args.variable)
        .with_debug(args.debug);

    let report = match run(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if args.json {
        output_json(&report);
    } else {
        print!("{}", report.render());
    }
}

fn init_logging(debug: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug, env.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("debug logging enabled");
}

/// `RUST_LOG` when set, otherwise info; `--debug` raises our crates either way
fn log_filter(debug: bool, env: Option<&str>) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    let mut filter = env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("vartrace={0},vartrace_core={0}", level)));

    if debug {
        for directive in ["vartrace=debug", "vartrace_core=debug"] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

fn output_json(report: &TrackReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: serializing report failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_survives_rust_log() {
        let filter = log_filter(true, Some("warn")).to_string();
        assert!(filter.contains("warn"));
        assert!(filter.contains("vartrace_core=debug"));
    }

    #[test]
    fn test_rust_log_used_without_debug() {
        let filter = log_filter(false, Some("vartrace_core=trace")).to_string();
        assert!(filter.contains("vartrace_core=trace"));
        assert!(!filter.contains("debug"));
    }

    #[test]
    fn test_default_filter() {
        let filter = log_filter(false, None).to_string();
        assert!(filter.contains("vartrace_core=info"));
    }
}
