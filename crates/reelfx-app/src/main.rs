//! ReelFX - apply effect chains to images and video clips
//!
//! Command-line front end of the effects engine.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reelfx_core::{MediumKind, RenderQuality};
use reelfx_effects::{ChainEntry, EffectChain, EffectsRegistry};
use reelfx_media::{ApplyOptions, Engine, EngineConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reelfx")]
#[command(author, version, about = "Apply effect chains to images and video clips")]
#[command(long_about = "
Applies an ordered chain of visual effects to a still image, an animated
image or a video clip.

Examples:
  reelfx list
  reelfx apply photo.jpg out.webp -e \"Black & White\" -e Vignette:high
  reelfx apply clip.mp4 out.mp4 -e \"Speed Control:low\" -e \"Fade In/Out\"
  reelfx apply clip.mp4 out.mp4 -e \"look-up table:grade.cube\" --quality draft
  reelfx apply a.png b.gif -o fx/ --chain-json chain.json
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an effect chain to one or more files
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// List the available effects
    #[command(visible_alias = "l")]
    List(ListArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Input file, followed by the output file unless --output-dir is given
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write one `<stem>_fx` artifact per input into this directory
    #[arg(short, long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Effect in chain order, as `name` or `name:level` (level, LUT path or value)
    #[arg(short, long = "effect")]
    effects: Vec<String>,

    /// JSON file holding the whole chain, e.g. `["Invert Colors", ["Vignette", "high"]]`
    #[arg(long = "chain-json", conflicts_with = "effects")]
    chain_json: Option<PathBuf>,

    /// Video encoder quality
    #[arg(short, long, value_enum, default_value_t = QualityArg::Final)]
    quality: QualityArg,

    /// Replacement audio track for video output
    #[arg(long)]
    audio: Option<PathBuf>,
}

#[derive(Args)]
struct ListArgs {
    /// Only effects usable on this kind of medium
    #[arg(short, long, value_enum)]
    medium: Option<MediumArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Draft,
    Final,
}

impl From<QualityArg> for RenderQuality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Draft => RenderQuality::Draft,
            QualityArg::Final => RenderQuality::Final,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MediumArg {
    Image,
    Animated,
    Video,
}

impl From<MediumArg> for MediumKind {
    fn from(arg: MediumArg) -> Self {
        match arg {
            MediumArg::Image => MediumKind::Image,
            MediumArg::Animated => MediumKind::Animated,
            MediumArg::Video => MediumKind::Video,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);

    match cli.command {
        Commands::Apply(args) => cmd_apply(&engine, args),
        Commands::List(args) => cmd_list(args),
    }
}

fn cmd_apply(engine: &Engine, args: ApplyArgs) -> Result<()> {
    let chain = match &args.chain_json {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read chain {}", path.display()))?;
            EffectChain::from_json(&json, engine.config().unknown_effects)?
        }
        None => {
            let entries: Vec<ChainEntry> = args.effects.iter().map(|e| ChainEntry::parse_arg(e)).collect();
            engine.chain_from_entries(&entries)?
        }
    };
    let mut options = ApplyOptions::default().with_quality(args.quality.into());
    if let Some(audio) = args.audio {
        options = options.with_audio(audio);
    }

    match args.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let outcomes = engine.apply_effects_batch(&args.paths, &chain, &options, |input| {
                fx_output_path(&dir, input)
            });
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
            for outcome in &outcomes {
                println!("{}", outcome.output.display());
            }
            if failed > 0 {
                bail!("{} of {} inputs failed", failed, outcomes.len());
            }
        }
        None => {
            let [input, output] = args.paths.as_slice() else {
                bail!("expected <INPUT> <OUTPUT>, or inputs with --output-dir");
            };
            let written = engine
                .apply_effects(input, &chain, output, &options)
                .with_context(|| format!("Failed to process {}", input.display()))?;
            info!(output = %written.display(), "done");
            println!("{}", written.display());
        }
    }
    Ok(())
}

/// `<dir>/<stem>_fx.<ext>`: stills become WebP, clips and animated images
/// MP4.
fn fx_output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = match MediumKind::from_path(input) {
        Some(MediumKind::Image) | None => "webp",
        Some(MediumKind::Animated | MediumKind::Video) => "mp4",
    };
    dir.join(format!("{}_fx.{}", stem, ext))
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let registry = EffectsRegistry::global();
    let effects: Vec<_> = match args.medium {
        Some(medium) => registry.effects_for(medium.into()).collect(),
        None => registry.effects().collect(),
    };
    for d in effects {
        let mut tags = Vec::new();
        if d.video_only {
            tags.push("video only");
        }
        if d.randomized {
            tags.push("random");
        }
        if d.kind.params(MediumKind::Video).is_some() {
            tags.push("levels");
        }
        if tags.is_empty() {
            println!("{}", d.name);
        } else {
            println!("{:<24} [{}]", d.name, tags.join(", "));
        }
    }
    Ok(())
}
