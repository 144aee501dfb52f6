//! Runs one `mint` through the client CLI of an already-running containerized
//! ledger and snapshots its output to `./output.txt`. The daemon, the
//! `2pc-network` network, and the client image are assumed to already exist;
//! this binary verifies none of them.

use std::process::ExitCode;

use clap::Parser;
use mint_capture::{Command, ExitPolicy, OneshotCapture};
use stacked_errors::{Result, StackableErr};

/// The pre-existing docker network the client container is attached to
const LEDGER_NETWORK: &str = "2pc-network";
/// The pre-built image holding the ledger client
const CLIENT_IMAGE: &str = "opencbdc-tx-twophase";
/// Path of the client binary inside the image
const CLIENT_BIN: &str = "./build/src/uhs/client/client-cli";
/// Client configuration and data files, resolved inside the image
const CLIENT_CONFIG: &str = "2pc-compose.cfg";
const MEMPOOL_FILE: &str = "mempool0.dat";
const WALLET_FILE: &str = "wallet0.dat";
/// `mint` invocation arguments: number of outputs and value per output
const MINT_OUTPUTS: &str = "10";
const MINT_VALUE: &str = "5";
/// Where the most recent successful run's stdout is persisted
const OUTPUT_PATH: &str = "./output.txt";

/// Runs a fixed `mint` invocation in the containerized ledger client and
/// persists the captured output
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Exit nonzero when the invocation fails, instead of only reporting the
    /// failure on the error console
    #[arg(long)]
    strict: bool,
}

/// The client binary and its arguments are passed to `docker run` as discrete
/// argument vector elements, nothing is interpreted by a shell.
fn mint_command() -> Command {
    Command::new("docker run").args([
        "--network",
        LEDGER_NETWORK,
        "-i",
        CLIENT_IMAGE,
        CLIENT_BIN,
        CLIENT_CONFIG,
        MEMPOOL_FILE,
        WALLET_FILE,
        "mint",
        MINT_OUTPUTS,
        MINT_VALUE,
    ])
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let policy = if args.strict {
        ExitPolicy::Strict
    } else {
        ExitPolicy::Lenient
    };

    let outcome = OneshotCapture::new(mint_command(), OUTPUT_PATH)
        .run()
        .await
        .stack()?;
    Ok(ExitCode::from(policy.status_for(&outcome)))
}
