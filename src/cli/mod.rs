pub mod completions;
pub mod convert;
pub mod init;
pub mod inspect;

use clap::{Parser, Subcommand};

/// sbtiled - convert pixel-painted Starbound dungeons to Tiled maps
#[derive(Parser, Debug)]
#[command(name = "sbtiled")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert .dungeon files and their PNG parts to Tiled JSON
    Convert(convert::ConvertArgs),

    /// Show how a dungeon's legacy tiles are classified
    Inspect(inspect::InspectArgs),

    /// Write a default sbtiled.yaml
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
