// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use clap::Args;
use colored::Colorize;

use sage_core::ut::track::progress_log;
use sage_data::data::Weights;

#[derive(Debug, Args)]
#[command(about = "Download pre-trained segmentation model weights.")]
pub struct DownloadWeightsArgs {
    #[arg(short, long, help = "Weights name.")]
    pub name: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(long, help = "List all available model weights.")]
    pub list: bool,

    #[arg(long, help = "Download all available model weights.")]
    pub all: bool,
}

pub fn download_weights(args: &DownloadWeightsArgs) {
    if args.list {
        print_weights();
    }

    if args.all {
        progress_log("Downloading all model weights to cache", args.verbose);

        for weights in Weights::iter() {
            weights.download(args.verbose);
        }

        std::process::exit(1);
    }

    if args.name.is_none() {
        eprintln!(
            "[sage::download::weights] The weights --name/-n must be specified. Run `sage download weights --list` to see all available weights."
        );
        std::process::exit(1);
    }

    let weights = Weights::select(args.name.as_ref().unwrap());
    weights.download(args.verbose);
}

fn print_weights() {
    println!("{:^69}", "\n");
    println!("| {:-^74} |", "");
    println!("| {:^74} |", "sage".truecolor(158, 181, 103).bold());
    println!("| {:^74} |", "Pre-trained segmentation model weights");
    println!("| {:-^18} | {:-^27} | {:-^10} | {:-^10} |", "", "", "", "");
    println!(
        "| {:^18} | {:^27} | {:^10} | {:^10} |",
        "model".bold(),
        "author".bold(),
        "size (GB)".bold(),
        "license".bold()
    );
    println!("| {:-^18} | {:-^27} | {:-^10} | {:-^10} |", "", "", "", "");

    for weights in Weights::iter() {
        println!(
            "| {:^18} | {:^27} | {:^10} | {:^10} |",
            weights.model_name(),
            weights.data_authors(),
            weights.data_size(),
            weights.license().replace("Apache License 2.0", "Apache-2.0"),
        );
    }

    println!("| {:-^18} | {:-^27} | {:-^10} | {:-^10} |", "", "", "", "");
    println!("{:^69}", "\n");

    std::process::exit(1);
}
