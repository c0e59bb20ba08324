// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use clap::{Parser, Subcommand};
use sage_cli::{download, segment};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    name: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Download(download::DownloadArgs),
    Segment(segment::SegmentArgs),
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Download(download_args)) => download::download(download_args),
        Some(Commands::Segment(segment_args)) => segment::segment(segment_args),
        None => {}
    }
}
