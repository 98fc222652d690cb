use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imagepath::config::Config;
use imagepath::constants::DEFAULT_CONFIG_FILE;
use imagepath::path::{generate, normalize, Params, SafeChars, Signer};

/// imagepath - parse, generate, sign and hash image request paths
#[derive(Parser, Debug)]
#[command(name = "imagepath")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signing secret, overrides the configuration file
    #[arg(long)]
    secret: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a request path and print its params as JSON
    Parse { path: String },
    /// Read params JSON from stdin and print the request path
    Generate {
        /// Sign with the configured secret instead of emitting unsafe/
        #[arg(long)]
        signed: bool,
    },
    /// Print the signature of a canonical path
    Sign { path: String },
    /// Check whether a request path is authorised
    Verify { path: String },
    /// Print the storage and result storage keys of a request path
    Hash { path: String },
    /// Print the normalised storage key of an image key
    Normalize { key: String },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None if PathBuf::from(DEFAULT_CONFIG_FILE).exists() => {
            Config::from_file(DEFAULT_CONFIG_FILE).context("Failed to load default configuration")?
        }
        None => Config::default(),
    };
    if let Some(secret) = &args.secret {
        config.signer.secret = secret.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    imagepath::logging::init_subscriber(args.json_logs)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let config = load_config(&args)?;
    tracing::debug!(
        algorithm = config.signer.algorithm.as_str(),
        truncate = config.signer.truncate,
        allow_unsafe = config.signer.allow_unsafe,
        "Configuration loaded"
    );

    match &args.command {
        Command::Parse { path } => {
            let params = config.parse_request(path);
            println!("{}", params.to_json()?);
        }
        Command::Generate { signed } => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read params from stdin")?;
            let params = Params::from_json(&input)?;
            if *signed {
                config.validate()?;
                println!("{}", generate(&params, Some(&config.signer())));
            } else {
                println!("{}", generate(&params, None));
            }
        }
        Command::Sign { path } => {
            config.validate()?;
            println!("{}", config.signer().sign(path));
        }
        Command::Verify { path } => {
            let params = config.parse_request(path);
            match config.authorize(&params) {
                Ok(()) => println!("ok"),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Request rejected");
                    println!("rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Hash { path } => {
            let params = config.parse_request(path);
            println!("storage: {}", config.storage_hasher().hash(&params.image));
            println!("result:  {}", config.result_storage_hasher().hash_result(&params));
        }
        Command::Normalize { key } => {
            let safe_chars = SafeChars::new(&config.storage.safe_chars);
            println!("{}", normalize(key, Some(&safe_chars)));
        }
    }

    Ok(())
}
