use std::{
    io::Write as _,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scholarchart", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the curves of an animation script.
    Inspect(InspectArgs),
    /// Print every curve's value at one point in time.
    Sample(SampleArgs),
    /// Play a script against a simulated display, one JSON line per sink call.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input animation script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input animation script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Elapsed time in seconds since the animation started.
    #[arg(long)]
    at: f64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input animation script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Simulated display refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Stop after this many frames even if the animation is still running.
    #[arg(long, default_value_t = 600)]
    max_frames: u64,

    /// Override the script's frame policy.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    AllOrNothing,
    Independent,
}

impl From<PolicyChoice> for scholarchart::FramePolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::AllOrNothing => Self::AllOrNothing,
            PolicyChoice::Independent => Self::Independent,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn read_script(path: &Path) -> anyhow::Result<scholarchart::AnimationScript> {
    scholarchart::AnimationScript::load(path)
        .with_context(|| format!("load animation script '{}'", path.display()))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let script = read_script(&args.in_path)?;
    let tracks = script.tracks();

    println!("looping:      {}", script.looping);
    println!("frame_policy: {:?}", script.frame_policy);
    println!("duration:     {}s", script.duration());
    println!("curves:");
    for t in &tracks {
        match t.track.last_time() {
            Some(last) => println!("  {}: {} keys, ends at {last}s", t.name, t.track.len()),
            None => println!("  {}: empty", t.name),
        }
    }
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.at.is_finite(), "--at must be a finite number of seconds");
    let script = read_script(&args.in_path)?;
    let tracks = script.tracks();

    // Past the end of a one-shot animation every curve rests on its final key.
    let time = script.playback_time(args.at);
    let at = time.unwrap_or_else(|| script.duration());

    let mut values = serde_json::Map::new();
    for t in &tracks {
        values.insert(t.name.clone(), serde_json::json!(t.track.value_at(at)));
    }

    let out = serde_json::json!({
        "elapsed": args.at,
        "time": at,
        "looping": script.looping,
        "ended": time.is_none(),
        "values": values,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive number"
    );
    let script = read_script(&args.in_path)?;
    let mut config = script.driver_config();
    if let Some(policy) = args.policy {
        config.frame_policy = policy.into();
    }

    let host = Rc::new(scholarchart::ManualFrameHost::new());
    let anim = script.into_animation(|name| {
        let clock = Rc::downgrade(&host);
        let name = name.to_string();
        Box::new(move |value: f64| {
            let t_ms = clock.upgrade().and_then(|h| h.now_ms());
            let line = serde_json::json!({ "t_ms": t_ms, "curve": name, "value": value });
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = writeln!(stdout, "{line}") {
                tracing::warn!(%err, "failed to write frame output");
            }
        })
    });

    let handle = scholarchart::run_animation(Rc::clone(&host), anim, config);

    let frames = host.run_at_fps(args.fps, args.max_frames);
    if host.pending() > 0 {
        // one more frame lets the driver observe the cancellation
        handle.cancel();
        host.advance(1000.0 / args.fps);
    }

    eprintln!(
        "played {frames} frames ({} rendered), final state {:?}",
        handle.frames_rendered(),
        handle.state()
    );
    Ok(())
}
