//! Scene Classification Example
//!
//! This example classifies still images into the Places365 scene categories
//! and prints the best matches for each image, optionally resolved to label
//! names from the published category table.
//!
//! Usage:
//! ```
//! cargo run --example classify -- --model-path <model.onnx> <image_paths>...
//! ```
//!
//! With label names and JSON output:
//! ```
//! cargo run --example classify -- --model-path <model.onnx> \
//!     --labels categories_places365.txt --json <image_paths>...
//! ```

use clap::Parser;
use scene365::classifier::SceneClassifier;
use scene365::core::init_tracing;
use scene365::processors::ChannelOrder;
use scene365::utils::{load_image, read_category_labels};
use std::path::Path;
use tracing::{error, info};

/// Command-line arguments for the scene classification example
#[derive(Parser)]
#[command(name = "classify")]
#[command(about = "Scene Classification Example - ranks Places365 categories for still images")]
struct Args {
    /// Path to the ONNX model file
    #[arg(short, long)]
    model_path: String,

    /// Path to the category label file (categories_places365.txt)
    #[arg(short, long)]
    labels: Option<String>,

    /// Channel order of the model's input planes (rgb or bgr)
    #[arg(long, default_value = "bgr")]
    channel_order: ChannelOrder,

    /// Number of ranked predictions per image
    #[arg(short, long, default_value_t = 5)]
    top_k: usize,

    /// Number of categories the model must score
    #[arg(long, default_value_t = 365)]
    expected_categories: usize,

    /// Print predictions as JSON lines instead of log output
    #[arg(long)]
    json: bool,

    /// Image file paths to classify
    #[arg(required = true)]
    images: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    init_tracing();

    let args = Args::parse();

    info!("Scene Classification Example");

    if !Path::new(&args.model_path).exists() {
        error!("Model file not found: {}", args.model_path);
        return Err("Model file not found".into());
    }

    // Load label names up front so a bad label file fails before inference
    let labels = match &args.labels {
        Some(path) => Some(read_category_labels(Path::new(path))?),
        None => None,
    };

    // Filter out non-existent image files and log errors for missing files
    let existing_images: Vec<String> = args
        .images
        .iter()
        .filter(|path| {
            let exists = Path::new(path).exists();
            if !exists {
                error!("Image file not found: {}", path);
            }
            exists
        })
        .cloned()
        .collect();

    if existing_images.is_empty() {
        error!("No valid image files found");
        return Err("No valid image files found".into());
    }

    let mut classifier = SceneClassifier::builder()
        .top_k(args.top_k)
        .channel_order(args.channel_order)
        .expected_categories(args.expected_categories)
        .build(Path::new(&args.model_path))?;

    info!(
        "Model ready: input {}, {} categories",
        classifier.geometry(),
        classifier.category_count()
    );

    for (i, image_path) in existing_images.iter().enumerate() {
        info!(
            "Processing image {} of {}: {}",
            i + 1,
            existing_images.len(),
            image_path
        );

        let image = match load_image(Path::new(image_path)) {
            Ok(image) => image,
            Err(e) => {
                error!("Failed to load {}: {}", image_path, e);
                continue;
            }
        };

        // Recoverable failures (unsupported channel layouts, runtime errors)
        // skip the image; the classifier stays usable for the rest.
        let predictions = match classifier.classify(&image) {
            Ok(predictions) => predictions,
            Err(e) => {
                error!("Classification failed for {}: {}", image_path, e);
                continue;
            }
        };

        if args.json {
            println!("{}", serde_json::to_string(&predictions)?);
            continue;
        }

        for (rank, prediction) in predictions.iter().enumerate() {
            match &labels {
                Some(labels) => {
                    let name = labels
                        .get(prediction.category)
                        .map(String::as_str)
                        .unwrap_or("?");
                    info!(
                        "   {}. {} (score: {:.3})",
                        rank + 1,
                        name,
                        prediction.score
                    );
                }
                None => {
                    info!(
                        "   {}. category {} (score: {:.3})",
                        rank + 1,
                        prediction.category,
                        prediction.score
                    );
                }
            }
        }
    }

    info!("Example completed!");
    Ok(())
}
