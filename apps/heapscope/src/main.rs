//! # Heapscope - Native Object Browser
//!
//! The main binary for browsing the native objects of a memory snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/heapscope (THE BINARY)               │
//! │                                                           │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────┐   │
//! │  │   CLI       │    │   Config    │    │   Render     │   │
//! │  │  (clap)     │    │   (toml)    │    │ (text/json)  │   │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬───────┘   │
//! │         │                  │                  │           │
//! │         └──────────────────┼──────────────────┘           │
//! │                            ▼                              │
//! │                   ┌─────────────────┐                     │
//! │                   │ heapscope-core  │                     │
//! │                   │   (THE LOGIC)   │                     │
//! │                   └─────────────────┘                     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! heapscope tree capture.hsnp --sort size --depth 2
//! heapscope summary capture.json --top 20
//! heapscope find capture.hsnp --address 0x7f3a2c001000
//! heapscope convert capture.json capture.hsnp
//! ```

use clap::Parser;
use heapscope::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Logs go to stderr so stdout stays clean for tree and JSON output.
    // HEAPSCOPE_LOG_FORMAT=json enables machine-parseable logs.
    let log_format = std::env::var("HEAPSCOPE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "heapscope=debug"
    } else {
        "heapscope=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Heapscope startup banner.
fn print_banner() {
    eprintln!(
        r#"
  _
 | |__   ___  __ _ _ __  ___  ___ ___  _ __   ___
 | '_ \ / _ \/ _` | '_ \/ __|/ __/ _ \| '_ \ / _ \
 | | | |  __/ (_| | |_) \__ \ (_| (_) | |_) |  __/
 |_| |_|\___|\__,_| .__/|___/\___\___/| .__/ \___|
                  |_|                 |_|

  Native Object Browser v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
