use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use unfurl::effects::{Fold2d, Fold3d, ShapeCut, Unveil};
use unfurl::{
    AnimationEvent, Effect, EffectController, EffectSpec, PngSequenceSurface, RenderLoopOpts,
    SourceKey, SourceSet, UiQueue, load_bitmap,
};

#[derive(Parser, Debug)]
#[command(name = "unfurl", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the frame an effect shows at a point in time, as a PNG.
    Frame(FrameArgs),
    /// Play an effect on the render thread and write every presented frame as a PNG.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Effect JSON (`{"effect": "unveil", ...}`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Image being revealed, cut or folded.
    #[arg(long)]
    cover: Option<PathBuf>,

    /// Brand image for the unveil effect.
    #[arg(long)]
    brand: Option<PathBuf>,

    /// Shape mask for the shape-cut effect.
    #[arg(long)]
    shape: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// Time since start, in milliseconds.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// Directory receiving `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Render at a fixed interval instead of as fast as possible.
    #[arg(long)]
    frame_interval_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn load_sources(args: &SourceArgs) -> anyhow::Result<(EffectSpec, SourceSet)> {
    let spec = EffectSpec::from_path(&args.in_path)?;
    spec.validate()?;

    let mut sources = SourceSet::new();
    for (key, path) in [
        (SourceKey::Cover, &args.cover),
        (SourceKey::Brand, &args.brand),
        (SourceKey::Shape, &args.shape),
    ] {
        if let Some(path) = path {
            let bitmap = load_bitmap(path).with_context(|| format!("load {key:?} image"))?;
            sources.insert(key, bitmap);
        }
    }
    Ok((spec, sources))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (spec, sources) = load_sources(&args.sources)?;
    let frame = spec.render_frame(sources, Duration::from_millis(args.at_ms))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let (spec, sources) = load_sources(&args.sources)?;
    let mut opts = RenderLoopOpts::from_env();
    if let Some(ms) = args.frame_interval_ms.filter(|&ms| ms > 0) {
        opts.pacing = unfurl::PacingPolicy::FixedInterval { interval_ms: ms };
    }

    let surface = Arc::new(PngSequenceSurface::new(spec.surface_size(), &args.out_dir)?);
    match spec {
        EffectSpec::Unveil(p) => play(Unveil, p, sources, surface.clone(), opts),
        EffectSpec::ShapeCut(p) => play(ShapeCut, p, sources, surface.clone(), opts),
        EffectSpec::Fold2d(p) => play(Fold2d, p, sources, surface.clone(), opts),
        EffectSpec::Fold3d(p) => play(Fold3d, p, sources, surface.clone(), opts),
    }?;

    eprintln!(
        "wrote {} frames to {}",
        surface.frames_written(),
        surface.dir().display()
    );
    Ok(())
}

/// Run one animation to completion, pumping the UI queue on this thread.
fn play<E: Effect>(
    effect: E,
    params: E::Params,
    sources: SourceSet,
    surface: Arc<PngSequenceSurface>,
    opts: RenderLoopOpts,
) -> anyhow::Result<()> {
    let queue = Arc::new(UiQueue::new());
    let mut controller = EffectController::new(effect, surface, queue.clone(), opts);
    let handle = controller.start_animation(sources, params)?;

    loop {
        queue.run_for(Duration::from_millis(50));
        let mut stopped = false;
        for event in handle.events().try_iter() {
            match event {
                AnimationEvent::FirstFrameRendered => tracing::info!("first frame rendered"),
                AnimationEvent::Ended => tracing::info!("animation ended"),
                AnimationEvent::RenderStopped(report) => {
                    eprintln!(
                        "frames: {} (skipped {}), avg {:.2} ms, max {:.2} ms",
                        report.frames,
                        report.skipped,
                        report.mean_ms(),
                        report.max.as_secs_f64() * 1000.0
                    );
                    stopped = true;
                }
            }
        }
        if stopped {
            break;
        }
    }

    controller.detach();
    Ok(())
}
