use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use palette::Srgb;
use palettecraft::{KMeansConfig, complementary_palette, extract_palette_from_bytes, rgb_to_hex};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Extract a color palette from an image using k-means clustering.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input image path
    image: PathBuf,

    /// Number of dominant colors to extract
    #[arg(short = 'k', long = "colors", default_value_t = 5)]
    n_colors: usize,

    /// Also compute and print complementary colors
    #[arg(long)]
    complement: bool,

    /// Save palette information as JSON to this path
    #[arg(long)]
    out_json: Option<PathBuf>,

    /// Shrink the longest side to this size before clustering (0 disables)
    #[arg(long, default_value_t = palettecraft::DEFAULT_MAX_DIMENSION)]
    resize: u32,

    /// Seed for centroid initialization
    #[arg(long, default_value_t = palettecraft::kmeans::DEFAULT_SEED)]
    seed: u64,

    /// Iteration cap for k-means
    #[arg(long, default_value_t = palettecraft::kmeans::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn color_json(rgb: Srgb<u8>) -> Value {
    json!({
        "rgb": [rgb.red, rgb.green, rgb.blue],
        "hex": rgb_to_hex(rgb),
    })
}

fn print_colors(title: &str, colors: &[Srgb<u8>]) {
    println!("{title}");
    for (idx, c) in colors.iter().enumerate() {
        println!("  {}. {} ({}, {}, {})", idx + 1, rgb_to_hex(*c), c.red, c.green, c.blue);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = KMeansConfig::default()
        .with_seed(args.seed)
        .with_max_iterations(args.max_iterations);
    let max_dimension = (args.resize > 0).then_some(args.resize);

    let bytes = fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    info!(path = %args.image.display(), bytes = bytes.len(), "Loaded image");

    let palette = extract_palette_from_bytes(&bytes, args.n_colors, max_dimension, &config)
        .context("palette extraction failed")?;
    let dominant: Vec<Srgb<u8>> = palette.iter().map(|c| c.rgb()).collect();
    let complements = if args.complement {
        complementary_palette(&palette)
    } else {
        Vec::new()
    };

    print_colors("Dominant colors:", &dominant);
    if args.complement {
        println!();
        print_colors("Complementary colors:", &complements);
    }

    if let Some(path) = &args.out_json {
        let mut data = json!({
            "dominant_colors": dominant.iter().copied().map(color_json).collect::<Vec<_>>(),
        });
        if args.complement {
            data["complementary_colors"] = complements.iter().copied().map(color_json).collect();
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&data)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved palette JSON to {}", path.display());
    }

    Ok(())
}
