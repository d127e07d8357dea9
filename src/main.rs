//! Wikka CLI
//!
//! Usage:
//!   wikka [OPTIONS] <COMMAND>
//!
//! Commands:
//!   view [NAME]         Render an article page (front page by default)
//!   edit <NAME>         Render the edit page of an article
//!   save <NAME> [FILE]  Save article content from FILE or stdin
//!   check               Load and pre-resolve everything, then list templates
//!
//! Options:
//!   -c, --config <FILE>  Configuration file [default: wikka.toml]
//!   -v, --verbose        Debug logging

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wikka::{Response, Wiki, WikiConfig};

#[derive(Parser)]
#[command(name = "wikka")]
#[command(about = "Minimal flat-file wiki")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, default_value = "wikka.toml")]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an article page
    View { name: Option<String> },
    /// Render the edit page of an article
    Edit { name: String },
    /// Save article content read from FILE, or stdin if omitted
    Save { name: String, file: Option<PathBuf> },
    /// Load and pre-resolve all templates and articles
    Check,
}

fn main() {
    let cli = Cli::parse();

    let config = match WikiConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config '{}': {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level, cli.verbose);

    let started = Instant::now();
    let wiki = match Wiki::open(config) {
        Ok(wiki) => wiki,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Wiki up and running after {:.3} ms",
        started.elapsed().as_secs_f64() * 1000.0
    );

    let response = match cli.command {
        Command::View { name } => {
            let name = name.unwrap_or_else(|| wiki.config().wiki.frontpage.clone());
            wiki.view(&name)
        }
        Command::Edit { name } => wiki.edit(&name),
        Command::Save { name, file } => {
            let content = match read_content(file.as_ref()) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("Error reading content: {}", e);
                    std::process::exit(1);
                }
            };
            wiki.save(&name, &content)
        }
        Command::Check => {
            for name in wiki.templates().names() {
                println!("{}", name);
            }
            println!(
                "{} templates, {} articles",
                wiki.templates().len(),
                wiki.articles().len()
            );
            return;
        }
    };

    debug!("Response status {}", response.status());
    match response {
        Response::Page { status, body } => {
            println!("{}", body);
            if status != 200 {
                std::process::exit(1);
            }
        }
        Response::Redirect { location } => println!("Location: {}", location),
    }
}

/// Log to stderr; `RUST_LOG` overrides the configured level
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_content(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
