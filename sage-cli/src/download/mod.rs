// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use clap::{Args, Subcommand};

mod weights;

use weights::{DownloadWeightsArgs, download_weights};

#[derive(Debug, Args)]
#[command(about = "Download pre-trained promptable segmentation models.")]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
#[command(flatten_help = true)]
pub struct DownloadArgs {
    #[command(subcommand)]
    command: Option<DownloadCommands>,
}

#[derive(Debug, Subcommand)]
enum DownloadCommands {
    Weights(DownloadWeightsArgs),
}

pub fn download(args: &DownloadArgs) {
    match args.command.as_ref().unwrap() {
        DownloadCommands::Weights(weights) => download_weights(weights),
    }
}
