use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "cdbmake",
    version,
    about = "Build a cdb from cdbmake-format records on stdin"
)]
struct Args {
    /// Database to create or replace
    dest: PathBuf,

    /// Temporary file, on the same filesystem as the destination
    tmp: PathBuf,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let dest = args.dest.to_string_lossy().into_owned();
    let tmp = args.tmp.to_string_lossy().into_owned();
    let mut cdb = cdbmap::CDBWriter::with_filenames(dest.as_str(), tmp.as_str())
        .with_context(|| format!("unable to create {}", tmp))?;

    let mut records = 0u64;
    cdbmap::text::read_records(io::stdin().lock(), |key, data| {
        records += 1;
        cdb.add(key, data)
    })
    .context("unable to build database")?;
    cdb.finish()
        .with_context(|| format!("unable to move {} to {}", tmp, dest))?;
    info!(records, path = %dest, "built cdb");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing();
    if let Err(e) = run(&args) {
        eprintln!("cdbmake: fatal: {:#}", e);
        process::exit(111);
    }
}
