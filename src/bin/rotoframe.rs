use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rotoframe", version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rotate a scene's rotor layer into animation frames and write PNGs.
    Render(RenderArgs),
    /// Print the procedure registrations as JSON.
    Procedures,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path (all visible layers flattened).
    #[arg(long)]
    out: PathBuf,

    /// Also write one PNG per frame into this directory; frame_000.png is the unrotated base.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Override the scene's step count.
    #[arg(long, allow_negative_numbers = true)]
    steps: Option<i32>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Procedures => cmd_procedures(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut scene = rotoframe::Scene::from_json_path(&args.in_path)
        .with_context(|| format!("load scene '{}'", args.in_path.display()))?;
    if let Some(steps) = args.steps {
        scene.rotate.steps = steps;
    }

    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let rendered = scene.render(assets_root)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    rendered.flat.save_png(&args.out, scene.mode)?;
    eprintln!("wrote {}", args.out.display());

    if let Some(dir) = &args.frames {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create frames dir '{}'", dir.display()))?;
        remove_frame_files(dir)?;
        for (i, frame) in rendered.frames.iter().enumerate() {
            frame.save_png(&dir.join(format!("frame_{i:03}.png")), scene.mode)?;
        }
        eprintln!(
            "wrote {} frames to {}",
            rendered.frames.len(),
            dir.display()
        );
    }
    Ok(())
}

/// Delete `frame_*.png` left by an earlier render so the directory holds only this run's frames.
fn remove_frame_files(dir: &Path) -> anyhow::Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("list frames dir '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".png"));
        if is_frame && path.is_file() {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove stale frame '{}'", path.display()))?;
        }
    }
    Ok(())
}

fn cmd_procedures() -> anyhow::Result<()> {
    let registry = rotoframe::Registry::builtin();
    let defs: Vec<&rotoframe::ProcedureDef> = registry.iter().collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&defs).context("serialize procedures")?
    );
    Ok(())
}
