mod driver;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use mapreel_core::{MapreelConfig, RenderMode};
use mapreel_render::video_decoder;

#[derive(Parser)]
#[command(
    name = "mapreel",
    version,
    about = "Mapreel: render a video side by side with its route map"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Map on the left, video on the right
    All,
    Map,
    Video,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::All => RenderMode::All,
            ModeArg::Map => RenderMode::Map,
            ModeArg::Video => RenderMode::Video,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a video with a map and encode the result
    Render {
        /// Input video file
        #[arg()]
        video: PathBuf,

        /// Map image (PNG, JPEG, ...)
        #[arg(short, long)]
        map: PathBuf,

        /// Route JSON drawn over the map
        #[arg(short, long)]
        route: Option<PathBuf>,

        /// Configuration file (default: mapreel.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output video file, or directory with --png-sequence
        #[arg(short, long, default_value = "output/mapreel.mp4")]
        output: PathBuf,

        /// Write numbered PNG frames instead of a video
        #[arg(long)]
        png_sequence: bool,

        #[arg(long, value_enum, default_value = "all")]
        mode: ModeArg,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,
    },

    /// Print the properties of a video stream
    Probe {
        #[arg()]
        video: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = "mapreel.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version and backend availability
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            video,
            map,
            route,
            config,
            output,
            png_sequence,
            mode,
            max_frames,
        } => {
            let config = load_config(config.as_deref())?;
            let summary = driver::render(&driver::RenderJob {
                video,
                map,
                route,
                output: output.clone(),
                png_sequence,
                mode: mode.into(),
                max_frames,
                config,
            })?;
            println!("Rendered {} frames to {}", summary.frames, output.display());
            println!(
                "   Video time: {:.2} s, wall time: {:.2} s ({:.1} fps)",
                summary.video_seconds,
                summary.wall_seconds,
                summary.average_fps()
            );
            Ok(())
        }
        Commands::Probe { video, json } => cmd_probe(&video, json),
        Commands::InitConfig { path, force } => cmd_init_config(&path, force),
        Commands::Info => cmd_info(),
    }
}

/// Load the given config file, or `mapreel.toml` when present, or the defaults.
fn load_config(path: Option<&Path>) -> Result<MapreelConfig> {
    match path {
        Some(path) => MapreelConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let default_path = Path::new("mapreel.toml");
            if default_path.exists() {
                MapreelConfig::load_from_file(default_path)
                    .with_context(|| format!("failed to load config {}", default_path.display()))
            } else {
                tracing::debug!("No config file, using defaults");
                Ok(MapreelConfig::default())
            }
        }
    }
}

fn cmd_probe(video: &Path, json: bool) -> Result<()> {
    let info = video_decoder::probe_stream(video)
        .with_context(|| format!("failed to probe {}", video.display()))?;
    let nominal = info.nominal_frame_duration_us();

    if json {
        let value = serde_json::json!({
            "path": video.display().to_string(),
            "width": info.width,
            "height": info.height,
            "frame_rate": info.frame_rate.to_string(),
            "time_base": info.time_base.to_string(),
            "codec": info.codec_name,
            "nominal_frame_duration_us": nominal,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", video.display());
    println!("   Size:       {}x{}", info.width, info.height);
    println!(
        "   Frame rate: {} ({:.3} fps)",
        info.frame_rate,
        info.frame_rate.as_f64()
    );
    println!("   Time base:  {}", info.time_base);
    println!(
        "   Codec:      {}",
        info.codec_name.as_deref().unwrap_or("unknown")
    );
    match nominal {
        Some(us) => println!("   Frame:      {} us", us),
        None => println!("   Frame:      unknown"),
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    MapreelConfig::default()
        .save_to_file(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("Mapreel");
    println!("   Version:  {}", env!("CARGO_PKG_VERSION"));
    println!(
        "   FFmpeg:   {}",
        if video_decoder::is_available() {
            "available"
        } else {
            "NOT FOUND"
        }
    );
    match mapreel_render::GpuContext::init() {
        Ok(gpu) => {
            let info = gpu.adapter.get_info();
            println!("   GPU:      {} ({:?})", info.name, info.backend);
        }
        Err(e) => println!("   GPU:      unavailable ({})", e),
    }
    Ok(())
}
