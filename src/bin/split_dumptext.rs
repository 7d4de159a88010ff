use std::io;

use clap::Parser;
use interop_dump_tools::{logging, split, AppendFileSink};

/// Split an InterOp `dumptext` listing read from stdin into per-metric CSV files.
///
/// Every `# <Name>,...` header starts a section that is appended to
/// `<Name>MetricsOut.csv` in the current directory.
#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Log each flushed section to stderr.
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    logging::init(args.debug);

    let stdin = io::stdin().lock();
    if let Err(err) = split(stdin, AppendFileSink::new(".")) {
        eprintln!("split_dumptext: {err}");
        std::process::exit(1);
    }
}
