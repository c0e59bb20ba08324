// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use clap::Args;

use sage_core::constant;
use sage_core::cv::BoundaryOp;
use sage_core::im::{Prompt, SageImage, Shape};
use sage_core::ut;
use sage_neural::{AnnotationSession, Device, SamPredictor};

#[derive(Debug, Args)]
#[command(about = "Segment an image from point and box prompts.")]
pub struct SegmentArgs {
    #[arg(short = 'i', long, help = "Input image.", required = true)]
    pub image: Option<String>,

    #[arg(short = 'o', long, help = "Output directory.", required = true)]
    pub output: Option<String>,

    #[arg(
        short = 'p',
        long,
        help = "Point prompt as x,y. Repeat the flag for multiple points."
    )]
    pub point: Vec<String>,

    #[arg(
        long,
        help = "Point labels (1 = foreground, 0 = background). One per point.",
        value_delimiter = ','
    )]
    pub point_labels: Option<Vec<u32>>,

    #[arg(short = 'b', long, help = "Box prompt as x0,y0,x1,y1.")]
    pub bbox: Option<String>,

    #[arg(
        long,
        help = "Device (auto, cpu, cuda, coreml).",
        default_value = "auto"
    )]
    pub device: Option<String>,

    #[arg(long, help = "Path to a local encoder .onnx file.")]
    pub encoder: Option<String>,

    #[arg(long, help = "Path to a local decoder .onnx file.")]
    pub decoder: Option<String>,

    #[arg(short = 'n', long, help = "Base name for saved masks.")]
    pub name: Option<String>,

    #[arg(
        short = 'm',
        long,
        help = "Save all candidate masks instead of only the best one."
    )]
    pub multimask: bool,

    #[arg(
        long,
        help = "Dilate the best mask n times before saving.",
        default_value = "0"
    )]
    pub dilate: Option<usize>,

    #[arg(
        long,
        help = "Erode the best mask n times before saving.",
        default_value = "0"
    )]
    pub erode: Option<usize>,

    #[arg(long, help = "Accept the best mask into a label map under this name.")]
    pub label: Option<String>,

    #[arg(long, help = "Export label names and colors to a JSON file.")]
    pub export_labels: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn segment(args: &SegmentArgs) {
    let image_path = args.image.to_owned().unwrap();
    let output = args.output.to_owned().unwrap();

    let extension = Path::new(&image_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    if !constant::SUPPORTED_IMAGE_FORMATS.contains(&extension) {
        eprintln!(
            "[sage::segment] ERROR: Unsupported image format '{}'. Supported formats: {}.",
            extension,
            constant::SUPPORTED_IMAGE_FORMATS.join(", ")
        );
        std::process::exit(1);
    }

    let mut shapes: Vec<Shape> = args
        .point
        .iter()
        .map(|p| {
            let xy = parse_floats(p, 2, "--point/-p");
            Shape::point(xy[1], xy[0])
        })
        .collect();

    if let Some(bbox) = args.bbox.as_ref() {
        let b = parse_floats(bbox, 4, "--bbox/-b");
        shapes.push(Shape::rectangle(vec![
            [b[1], b[0]],
            [b[1], b[2]],
            [b[3], b[2]],
            [b[3], b[0]],
        ]));
    }

    if let Some(labels) = args.point_labels.as_ref() {
        if labels.len() != args.point.len() {
            eprintln!(
                "[sage::segment] ERROR: Got {} point labels for {} points.",
                labels.len(),
                args.point.len()
            );
            std::process::exit(1);
        }
    }

    let prompt = Prompt::from_shapes(&shapes, args.point_labels.as_deref());

    if prompt.is_empty() {
        eprintln!(
            "[sage::segment] ERROR: At least one --point/-p or a --bbox/-b prompt is required."
        );
        std::process::exit(1);
    }

    let device = Device::select(args.device.as_deref().unwrap_or("auto"));

    let predictor = match (args.encoder.as_ref(), args.decoder.as_ref()) {
        (Some(encoder), Some(decoder)) => {
            SamPredictor::load(encoder, decoder, device, args.verbose)
        }
        (None, None) => SamPredictor::from_pretrained(device, args.verbose),
        _ => {
            eprintln!(
                "[sage::segment] ERROR: --encoder and --decoder must be provided together."
            );
            std::process::exit(1);
        }
    }
    .unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    let image = SageImage::open(&image_path).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    let image_name = Path::new(&image_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    let mut session = AnnotationSession::new(predictor);

    session.set_image(&image_name, &image).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    let (n_masks, best_score) = session
        .predict(&prompt, args.multimask)
        .map(|prediction| (prediction.masks.len(), prediction.best_score()))
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

    ut::track::progress_log(
        format!(
            "Predicted {} candidate mask(s) | best score {:.4}",
            n_masks, best_score
        )
        .as_str(),
        args.verbose,
    );

    for _ in 0..args.dilate.unwrap_or(0) {
        session.adjust_boundary(BoundaryOp::Dilate).unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });
    }

    for _ in 0..args.erode.unwrap_or(0) {
        session.adjust_boundary(BoundaryOp::Erode).unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });
    }

    if let Some(label) = args.label.as_ref() {
        let id = session.accept_mask(label).unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

        ut::track::progress_log(
            format!("Accepted mask '{}' as label {}", label, id).as_str(),
            args.verbose,
        );
    }

    let saved = session
        .save_masks(&output, args.name.as_deref())
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

    ut::track::progress_log(
        format!("Saved {} mask(s) to {}", saved.len(), output).as_str(),
        args.verbose,
    );

    if let Some(export) = args.export_labels.as_ref() {
        session.export_labels(export).unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

        ut::track::progress_log(
            format!("Exported label info to {}", export).as_str(),
            args.verbose,
        );
    }
}

fn parse_floats(value: &str, expected: usize, context: &str) -> Vec<f32> {
    let parsed: Result<Vec<f32>, _> = value
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect();

    match parsed {
        Ok(values) if values.len() == expected => values,
        _ => {
            eprintln!(
                "[sage::segment] ERROR: {} must be {} comma-separated numbers (got '{}').",
                context, expected, value
            );
            std::process::exit(1);
        }
    }
}
