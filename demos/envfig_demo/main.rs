//! # envfig demo application
//!
//! A sample CLI tool that loads its settings from environment variables
//! with envfig. It exists to demonstrate and manually verify the fallback
//! chain and the warning/fatal report.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example envfig_demo -- show
//! cargo run --example envfig_demo -- keys
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                   | How to exercise it                                                        |
//! |---------------------------|---------------------------------------------------------------------------|
//! | Literal defaults          | `cargo run --example envfig_demo -- show`                                 |
//! | Env var wins              | `DEMO_PORT=9000 cargo run --example envfig_demo -- show`                  |
//! | Invalid value, warning    | `DEMO_PORT=nope cargo run --example envfig_demo -- show`                  |
//! | `defaultFrom`             | `DEMO_HOST=10.0.0.5 cargo run --example envfig_demo -- show`              |
//! | Fatal (no fallback)       | `cargo run --example envfig_demo -- show` without `DEMO_UPSTREAM`         |
//! | Comma-list default        | `DEMO_PEERS= cargo run --example envfig_demo -- show`                     |
//! | Synthetic variables       | `cargo run --example envfig_demo -- --set DEMO_PORT=1 show`               |
//! | JSON report               | `cargo run --example envfig_demo -- show --json`                          |
//! | Compile-time tracing      | `RUST_LOG=envfig=debug cargo run --example envfig_demo -- keys`           |

mod config;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use envfig::{Envfig, EnvfigBuilder, Loaded};

use config::DemoConfig;

/// envfig demo: print configuration resolved from the environment.
#[derive(Parser, Debug)]
#[command(name = "envfig-demo")]
struct Cli {
    /// Use these variables instead of the process environment (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", global = true, value_parser = parse_pair)]
    vars: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the configuration and print it with any warnings and errors.
    Show {
        /// Print the outcome as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List the environment variables the configuration reads.
    Keys,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))
}

fn make_builder(cli: &Cli) -> EnvfigBuilder<DemoConfig> {
    let builder = Envfig::builder::<DemoConfig>().log(false);
    if cli.vars.is_empty() {
        builder
    } else {
        builder.vars(cli.vars.clone())
    }
}

fn print_config(config: &DemoConfig) {
    println!("log_level    = {}", config.log_level);
    println!("server.host  = {}", config.server.host);
    println!("server.port  = {}", config.server.port);
    println!("server.public_host = {}", config.server.public_host);
    println!("server.timeout = {:?}", config.server.timeout);
    println!("server.tls   = {}", config.server.tls);
    println!("peers        = {:?}", config.peers);
    match &config.upstream {
        Some(url) => println!("upstream     = {url}"),
        None => println!("upstream     = (unset)"),
    }
    println!("build        = {}", config.build);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let builder = make_builder(&cli);

    match cli.command {
        Commands::Keys => match builder.compile() {
            Ok(parser) => {
                for key in parser.keys() {
                    println!("{key}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Show { json } => {
            let Loaded { value, outcome } = match builder.load() {
                Ok(loaded) => loaded,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            };
            print_config(&value);
            if json {
                match serde_json::to_string_pretty(&outcome) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            } else if !outcome.is_clean() {
                eprintln!("{outcome}");
            }
            if outcome.has_fatal() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}
