use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facetrace_core::{resolve_target, FrameDirSource, ScanResult, ScanSettings, Scanner};
use facetrace_onnx::OnnxProvider;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facetrace", about = "Scan an image corpus or video frames for a target face")]
struct Cli {
    /// Pretty-print the result JSON.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every image in a folder for the target face
    Folder {
        /// Path to the target face image
        #[arg(long)]
        target: PathBuf,
        /// Folder of images to scan (jpg/jpeg/png)
        #[arg(long)]
        folder: PathBuf,
        /// Maximum embedding distance for a match
        #[arg(long, default_value_t = 0.45)]
        threshold: f32,
    },
    /// Scan an extracted, ordered frame sequence for the target face
    Video {
        /// Path to the target face image
        #[arg(long)]
        target: PathBuf,
        /// Directory of pre-extracted frames, in filename order
        /// (e.g. ffmpeg's frame_%06d.jpg)
        #[arg(long)]
        frames_dir: PathBuf,
        /// Frame rate of the source video
        #[arg(long)]
        fps: f64,
        /// Maximum embedding distance for a match
        #[arg(long, default_value_t = 0.6)]
        threshold: f32,
        /// Process every nth frame
        #[arg(long, default_value_t = 5)]
        frame_skip: u32,
        /// Output directory (required with --save-thumbnails)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Save a thumbnail of each matching frame
        #[arg(long)]
        save_thumbnails: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    match run(cli.command) {
        Ok(result) => {
            let json = if pretty {
                serde_json::to_string_pretty(&result)
            } else {
                serde_json::to_string(&result)
            }
            .expect("scan result serializes");
            println!("{json}");
        }
        Err(e) => {
            // Fatal errors go to stdout as an error document, matching the
            // result contract consumers parse.
            println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<ScanResult> {
    let model_dir = facetrace_onnx::default_model_dir();
    let mut provider = OnnxProvider::load(&model_dir)
        .with_context(|| format!("loading models from {}", model_dir.display()))?;

    match command {
        Commands::Folder { target, folder, threshold } => {
            let target = resolve_target(&mut provider, &target)?;
            let settings = ScanSettings { threshold, frame_skip: 1, save_thumbnails: false };
            let mut scanner = Scanner::new(provider, target, settings)?;
            Ok(scanner.scan_folder(&folder)?)
        }
        Commands::Video {
            target,
            frames_dir,
            fps,
            threshold,
            frame_skip,
            output,
            save_thumbnails,
        } => {
            let target = resolve_target(&mut provider, &target)?;
            let settings = ScanSettings { threshold, frame_skip, save_thumbnails };
            let mut scanner = Scanner::new(provider, target, settings)?;
            let source = FrameDirSource::open(&frames_dir, fps)?;
            tracing::info!(frames = source.len(), fps, "scanning frame sequence");
            Ok(scanner.scan_video(source, &frames_dir, output.as_deref())?)
        }
    }
}
