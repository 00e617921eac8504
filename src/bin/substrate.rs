use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use substrate::config::ABSOLUTE_MAX_WORKERS;
use substrate::{
    JsonFileStore, NullSink, Orchestrator, PngSink, SceneOptions, WorldSize, seed_from_str,
};

#[derive(Parser, Debug)]
#[command(name = "substrate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grow scenes and write each finished scene as a PNG.
    Run(RunArgs),
    /// Time scenes at increasing replica counts and store the fastest.
    Calibrate(CalibrateArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Scene options JSON. Flags override values from the file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// World width in cells (and output pixels).
    #[arg(long)]
    width: Option<u32>,

    /// World height in cells (and output pixels).
    #[arg(long)]
    height: Option<u32>,

    /// Seed of the first scene.
    #[arg(long, conflicts_with = "seed_text")]
    seed: Option<u64>,

    /// Derive the first seed from a phrase.
    #[arg(long)]
    seed_text: Option<String>,

    /// Where the calibrated replica count is stored.
    #[arg(long, default_value = "substrate-prefs.json")]
    prefs: PathBuf,

    /// Light background; painters blend instead of adding light.
    #[arg(long)]
    light: bool,

    /// Verbose diagnostics.
    #[arg(long)]
    dev: bool,

    /// Calibrate up to the worker ceiling instead of stopping at the first slowdown.
    #[arg(long)]
    calibrate_all: bool,

    /// Largest replica count calibration may try.
    #[arg(long)]
    max_workers: Option<usize>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Replica count. Overrides any stored calibration.
    #[arg(long, conflicts_with = "calibrate")]
    workers: Option<usize>,

    /// Calibrate before running regular scenes.
    #[arg(long)]
    calibrate: bool,

    /// Stop after this many scenes. Runs forever when omitted.
    #[arg(long)]
    scenes: Option<u64>,

    /// Directory receiving one PNG per scene.
    #[arg(long, default_value = "substrate-out")]
    out: PathBuf,

    /// Pause between scenes, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct CalibrateArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Also write every calibration scene as a PNG into this directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Calibrate(args) => cmd_calibrate(args),
    }
}

fn init_tracing(dev: bool) {
    let level = if dev {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn scene_options(args: &SceneArgs) -> anyhow::Result<SceneOptions> {
    let mut opts = match &args.config {
        Some(path) => SceneOptions::from_path(path)?,
        None => SceneOptions::default(),
    };
    if args.width.is_some() || args.height.is_some() {
        opts.world = WorldSize::new(
            args.width.unwrap_or(opts.world.w),
            args.height.unwrap_or(opts.world.h),
        )?;
    }
    if let Some(seed) = args.seed {
        opts.seed = seed;
    }
    if let Some(text) = &args.seed_text {
        opts.seed = seed_from_str(text);
    }
    if args.light {
        opts.dark_mode = false;
        opts.blending_additive = false;
        opts.blending_subtractive = false;
    }
    if args.dev {
        opts.dev_mode = true;
    }
    if args.calibrate_all {
        opts.calibration_early_exit = false;
    }
    if let Some(max) = args.max_workers {
        opts.calibration_max_workers = max;
    }
    opts.validate()?;
    Ok(opts)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut opts = scene_options(&args.scene)?;
    init_tracing(opts.dev_mode);
    if args.calibrate || args.scene.calibrate_all {
        opts.calibration_required = true;
    }
    if let Some(delay) = args.delay_ms {
        opts.transition_delay_ms = delay;
    }

    let store = JsonFileStore::new(&args.scene.prefs);
    let mut orchestrator = Orchestrator::new(opts, PngSink::new(&args.out), store)?;
    if let Some(workers) = args.workers {
        orchestrator = orchestrator.with_worker_count(workers)?;
    }
    let summary = orchestrator.run(args.scenes).context("run scenes")?;

    if let Some(pref) = summary.calibrated {
        eprintln!(
            "calibrated: {} workers ({} ms)",
            pref.worker_count, pref.benchmark_ms
        );
    }
    eprintln!(
        "wrote {} scene(s) to {} using {} worker(s)",
        summary.scenes,
        args.out.display(),
        summary.worker_count
    );
    Ok(())
}

fn cmd_calibrate(args: CalibrateArgs) -> anyhow::Result<()> {
    let mut opts = scene_options(&args.scene)?;
    init_tracing(opts.dev_mode);
    opts.calibration_required = true;
    opts.calibration_max_workers = opts.calibration_max_workers.min(ABSOLUTE_MAX_WORKERS);
    opts.transition_delay_ms = 0;

    let store = JsonFileStore::new(&args.scene.prefs);
    let summary = match &args.out {
        Some(dir) => Orchestrator::new(opts, PngSink::new(dir), store)?.calibrate(),
        None => Orchestrator::new(opts, NullSink, store)?.calibrate(),
    }
    .context("calibrate")?;

    match summary.calibrated {
        Some(pref) => {
            println!("{}", pref.worker_count);
            eprintln!(
                "stored {} workers ({} ms) in {}",
                pref.worker_count,
                pref.benchmark_ms,
                args.scene.prefs.display()
            );
            Ok(())
        }
        None => anyhow::bail!("calibration ended without choosing a worker count"),
    }
}
