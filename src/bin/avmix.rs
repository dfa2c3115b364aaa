use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "avmix", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a playlist and report what it declares.
    Check(CheckArgs),
    /// Render frames as PNG files.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Playlist JSON.
    #[arg(long)]
    playlist: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Playlist JSON; reloaded when it changes.
    #[arg(long)]
    playlist: PathBuf,

    /// Updates JSON; applied when it changes.
    #[arg(long)]
    updates: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Output directory for `frame_NNNNN.png`.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    #[arg(long, default_value_t = 25.0)]
    fps: f64,

    /// Show placeholders for late sources instead of waiting.
    #[arg(long)]
    live: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let text = read_text(&args.playlist)?;
    let file = args.playlist.display().to_string();
    let pl = avmix::Playlist::parse(&text, Some(&file))
        .with_context(|| format!("parse playlist '{file}'"))?;

    let node_count: usize = pl.nodes.iter().map(count_nodes).sum();
    println!("sequences: {}", pl.sequences.len());
    println!("scene nodes: {node_count}");
    println!("timers: {}", pl.timers.len());
    println!("scripts: {}", pl.scripts.len());
    println!("config: {}", if pl.config.is_some() { "yes" } else { "no" });
    println!("rejected: {}", pl.rejected);
    if pl.is_empty() {
        anyhow::bail!("playlist '{file}' has no valid root objects");
    }
    Ok(())
}

fn count_nodes(decl: &avmix::scene::NodeDecl) -> usize {
    match &decl.kind {
        avmix::scene::NodeDeclKind::Scene { .. } => 1,
        avmix::scene::NodeDeclKind::Group { children } => {
            1 + children.iter().map(count_nodes).sum::<usize>()
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = avmix::MixerConfig {
        width: args.width,
        height: args.height,
        fps: args.fps,
        live: args.live,
        ..avmix::MixerConfig::default()
    };
    let mut mixer = avmix::Mixer::new(config, Box::new(avmix::BuiltinProvider))?;
    if let Err(err) = mixer.load_playlist_file(&args.playlist) {
        warn!(file = %args.playlist.display(), error = %err, "initial playlist load failed; starting empty");
    }
    if let Some(updates) = &args.updates {
        mixer.watch_updates_file(updates);
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let fps = mixer.config().fps;
    let mut written = 0u64;
    while written < args.frames {
        mixer.poll_files();
        let now = written as f64 / fps;
        let frame = match mixer.render_frame(now)? {
            avmix::FrameOutcome::Ready(f) => f,
            avmix::FrameOutcome::NotReady => {
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }
        };
        let out = args.out.join(format!("frame_{written:05}.png"));
        let rgba = avmix::media::unpremultiply_rgba8(&frame.pixels);
        image::save_buffer_with_format(
            &out,
            &rgba,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", out.display()))?;
        written += 1;
    }

    info!(frames = written, out = %args.out.display(), "render done");
    eprintln!("wrote {written} frames to {}", args.out.display());
    Ok(())
}
