use clap::Parser;
use miette::Result;
use sbtiled::cli::{Cli, Commands};
use sbtiled::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();

    match cli.command {
        Commands::Convert(args) => sbtiled::cli::convert::run(args, &printer)?,
        Commands::Inspect(args) => sbtiled::cli::inspect::run(args, &printer)?,
        Commands::Init(args) => sbtiled::cli::init::run(args, &printer)?,
        Commands::Completions(args) => sbtiled::cli::completions::run(args)?,
    }

    Ok(())
}
