//! tollgate-ctl: operator tooling for throttle definitions and configuration.

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tollgate_core::OperationTag;

use cmd::check::cmd_check;
use cmd::config::{cmd_config, cmd_config_init};
use cmd::simulate::cmd_simulate;

const DEFAULT_NODES: u64 = 1;
const DEFAULT_TPS: u64 = 100;

fn print_usage() {
    println!("Usage: tollgate-ctl [--nodes <n>] [--tps <rate>] <command>");
    println!();
    println!("Commands:");
    println!("  check <defs.json>                       Validate definitions and show resolved throttles");
    println!("  simulate <defs.json> <operation> <count> Offer <count> calls and report admissions");
    println!("  config                                  Show the effective configuration");
    println!("  config init                             Write a default config file if none exists");
    println!();
    println!("Options:");
    println!("  --nodes <n>     Nodes sharing network capacity (default: {})", DEFAULT_NODES);
    println!("  --tps <rate>    Offered rate for simulate (default: {})", DEFAULT_TPS);
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut nodes = DEFAULT_NODES;
    let mut tps = DEFAULT_TPS;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--nodes" => {
                i += 1;
                nodes = args
                    .get(i)
                    .context("--nodes requires a value")?
                    .parse()
                    .context("--nodes must be a number")?;
            }
            "--tps" => {
                i += 1;
                tps = args
                    .get(i)
                    .context("--tps requires a value")?
                    .parse()
                    .context("--tps must be a number")?;
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["check", path] => cmd_check(&PathBuf::from(path), nodes),
        ["simulate", path, op, count] => {
            let op: OperationTag = op.parse()?;
            let count = count.parse().context("<count> must be a number")?;
            cmd_simulate(&PathBuf::from(path), op, count, tps, nodes)
        }
        ["config"] => cmd_config(),
        ["config", "init"] => cmd_config_init(),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
