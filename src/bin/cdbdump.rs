use std::io::{self, BufWriter, Read, Write};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "cdbdump",
    version,
    about = "Print every record of the cdb on stdin in cdbmake format"
)]
struct Args {}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn run() -> Result<()> {
    let mut data = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut data)
        .context("unable to read input")?;
    let cdb = cdbmap::CDB::new(data);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    cdbmap::text::dump(&cdb, &mut out).context("unable to read input")?;
    out.flush().context("unable to write output")?;
    Ok(())
}

fn main() {
    let _args = Args::parse();
    init_tracing();
    if let Err(e) = run() {
        eprintln!("cdbdump: fatal: {:#}", e);
        process::exit(111);
    }
}
