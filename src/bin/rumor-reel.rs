use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use rumor_reel::{
    AnimationRegistry, ComposedCycle, Composer, Dataset, Evaluator, Player, PlayerEvent,
    ReelConfig, Scene, orchestrator::render,
};

#[derive(Parser, Debug)]
#[command(name = "rumor-reel", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run display cycles on a virtual clock.
    Play(PlayArgs),
    /// Compose one rumor and print its labels and timing descriptor.
    Compose(ComposeArgs),
    /// Print the evaluated scene state of one rumor at a master time.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Rumor dataset JSON.
    #[arg(long)]
    data: PathBuf,

    /// Config JSON (defaults apply to missing fields).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of cycles to run before exiting.
    #[arg(long, default_value_t = 1)]
    cycles: u64,

    /// Frame ticks per wall-clock second.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Seed for rotation order and container positions.
    #[arg(long)]
    seed: Option<u64>,

    /// Always show the first rumor.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Write every sampled frame as a JSON line.
    #[arg(long)]
    frames_out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Rumor dataset JSON.
    #[arg(long)]
    data: PathBuf,

    /// Rumor key (title).
    #[arg(long)]
    key: String,

    /// Config JSON (defaults apply to missing fields).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Rumor dataset JSON.
    #[arg(long)]
    data: PathBuf,

    /// Rumor key (title).
    #[arg(long)]
    key: String,

    /// Master timeline time in seconds.
    #[arg(long)]
    time: f64,

    /// Config JSON (defaults apply to missing fields).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Play(args) => cmd_play(args),
        Command::Compose(args) => cmd_compose(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ReelConfig> {
    match path {
        Some(p) => ReelConfig::from_path(p).with_context(|| format!("load config '{}'", p.display())),
        None => Ok(ReelConfig::default()),
    }
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    Dataset::from_path(path).with_context(|| format!("load dataset '{}'", path.display()))
}

fn compose_one(dataset: &Dataset, key: &str, cfg: &ReelConfig) -> anyhow::Result<ComposedCycle> {
    let record = dataset
        .get(key)
        .with_context(|| format!("no rumor with key '{key}'"))?;
    let mut scene = Scene::with_container();
    render(&mut scene, record, cfg, &mut StdRng::seed_from_u64(0))?;
    let registry = AnimationRegistry::with_builtin();
    Ok(Composer::new(cfg, &registry).compose(record, &scene)?)
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fps > 0.0 && args.fps.is_finite(),
        "--fps must be finite and > 0"
    );
    let dataset = load_dataset(&args.data)?;
    let cfg = load_config(args.config.as_deref())?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut frames = match &args.frames_out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("create '{}'", path.display()))?,
        )),
        None => None,
    };

    let mut player = Player::new(dataset, cfg, AnimationRegistry::with_builtin(), rng);
    player.set_debug_mode(args.debug);

    let dt = 1.0 / args.fps;
    let mut finished = 0u64;
    let mut events = player.start();
    while finished < args.cycles {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
            if matches!(
                event,
                PlayerEvent::CycleCompleted { .. } | PlayerEvent::CycleLost { .. }
            ) {
                finished += 1;
            }
        }
        if finished >= args.cycles {
            break;
        }
        if let (Some(out), Some(frame)) = (frames.as_mut(), player.current_frame()?) {
            serde_json::to_writer(&mut *out, &frame)?;
            out.write_all(b"\n")?;
        }
        events = player.tick(dt);
    }

    if let Some(mut out) = frames {
        out.flush()?;
    }
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.data)?;
    let cfg = load_config(args.config.as_deref())?;
    let cycle = compose_one(&dataset, &args.key, &cfg)?;
    println!("{}", serde_json::to_string_pretty(&cycle.report())?);
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.data)?;
    let cfg = load_config(args.config.as_deref())?;
    let cycle = compose_one(&dataset, &args.key, &cfg)?;
    let frame = Evaluator::sample(&cycle.plan, args.time)?;
    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}
