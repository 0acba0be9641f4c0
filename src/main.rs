mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    cli::init_logging(args.global.verbose);
    cli::run(args)
}
