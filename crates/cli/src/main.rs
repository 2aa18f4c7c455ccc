// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use anchor_cli::commands::{build, canonicalize, hashes, locator, submit, verify};
use anchor_cli::output::{error_line, render, with_status};
use anchor_node::config::NodeConfig;
use anchor_node::errors::AnchorError;

/// Exit code of a verification that ran but did not pass.
const EXIT_VERIFY_FAILED: u8 = 3;

#[derive(Parser)]
#[command(name = "anchor")]
#[command(about = "Canonical proof hashing, anchoring and triple-equality verification", long_about = None)]
struct Cli {
    /// Node gateway URL (overrides ANCHOR_GATEWAY_URL)
    #[arg(long, global = true)]
    gateway: Option<String>,

    /// Bearer token for the gateway (overrides ANCHOR_AUTH_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Render a table instead of a JSON status line
    #[arg(long, global = true)]
    table: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonicalize a JSON document (`-` for stdin) and print its hash
    Canonicalize {
        file: PathBuf,
    },
    /// Build a proof record from a params file without submitting it
    Build {
        params: PathBuf,

        /// Message size cap (defaults to ANCHOR_MAX_MESSAGE_BYTES)
        #[arg(long)]
        max_bytes: Option<usize>,

        /// Write the canonical record bytes here
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Compute inputsHash and ruleHash
    Hashes {
        #[arg(long)]
        domain: String,

        #[arg(long)]
        operator: String,

        /// Input reference; repeat for each input
        #[arg(long = "input", required = true)]
        inputs: Vec<String>,
    },
    /// Parse and normalize a locator URI
    Locator {
        uri: String,
    },
    /// Append and bind a proof through the gateway
    Submit {
        params: PathBuf,
    },
    /// Check event, log and expected hash agree for a transaction
    Verify {
        transaction_id: String,

        /// Locally computed proof hash to compare against
        #[arg(long)]
        expected: Option<String>,
    },
}

fn main() -> ExitCode {
    anchor_node::telemetry::init_logging("anchor_cli=info,anchor_node=warn");
    let cli = Cli::parse();

    let (line, code) = match execute(&cli) {
        Ok((line, code)) => (line, code),
        Err(e) => {
            let err = match e.downcast::<AnchorError>() {
                Ok(err) => err,
                Err(other) => AnchorError::Internal(format!("{:#}", other)),
            };
            tracing::debug!("command failed: {:?}", err);
            (error_line(&err), exit_code(err.exit_code()))
        }
    };

    println!("{}", render(&line, cli.table));
    ExitCode::from(code)
}

fn ok(report: serde_json::Value) -> anyhow::Result<(serde_json::Value, u8)> {
    Ok((with_status("ok", report), 0))
}

fn exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = NodeConfig::from_env()?;
    if let Some(url) = &cli.gateway {
        config.gateway_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.auth_token = Some(token.clone());
    }
    Ok(config)
}

fn execute(cli: &Cli) -> anyhow::Result<(serde_json::Value, u8)> {
    match &cli.command {
        Commands::Canonicalize { file } => ok(canonicalize::run(file)?),
        Commands::Build { params, max_bytes, out } => {
            let limit = match max_bytes {
                Some(limit) => *limit,
                None => load_config(cli)?.max_message_bytes,
            };
            ok(build::run(params, limit, out.as_deref())?)
        }
        Commands::Hashes { domain, operator, inputs } => ok(hashes::run(domain, operator, inputs)?),
        Commands::Locator { uri } => ok(locator::run(uri)?),
        Commands::Submit { params } => ok(submit::run(&load_config(cli)?, params)?),
        Commands::Verify { transaction_id, expected } => {
            let report = verify::run(&load_config(cli)?, transaction_id, expected.as_deref())?;
            let (status, code) = if report.pass() { ("pass", 0) } else { ("fail", EXIT_VERIFY_FAILED) };
            Ok((with_status(status, serde_json::to_value(&report)?), code))
        }
    }
}
