use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use scene_timeline_core::{
    render, AnalysisOutcome, AppConfig, AudioAnalysisResult, AudioBuffer, AudioEngine,
    InteractionState, RawScene, RenderState, ScenePlanner, SegmentPlanner, TimelineError,
    TimelineModel, Viewport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> scene_timeline_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Analyze { input, output } => run_analyze(&config, &input, output.as_deref()).await,
        Commands::Plan {
            input,
            scenes,
            render_width,
        } => run_plan(&config, &input, scenes.as_deref(), render_width).await,
    }
}

async fn analyze(config: &AppConfig, input: &Path) -> scene_timeline_core::Result<AudioAnalysisResult> {
    tracing::info!(?input, "decoding audio");
    let buffer = AudioBuffer::open(input)?;
    let engine = AudioEngine::new(config.analysis.clone());

    match engine.analyze(buffer).await? {
        AnalysisOutcome::Completed(result) => Ok((*result).clone()),
        AnalysisOutcome::Superseded { generation } => Err(TimelineError::msg(format!(
            "analysis {generation} was superseded"
        ))),
    }
}

async fn run_analyze(
    config: &AppConfig,
    input: &Path,
    output: Option<&Path>,
) -> scene_timeline_core::Result<()> {
    let result = analyze(config, input).await?;
    let json = serde_json::to_string_pretty(&result)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(?path, "analysis written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn run_plan(
    config: &AppConfig,
    input: &Path,
    scenes: Option<&Path>,
    render_width: Option<f64>,
) -> scene_timeline_core::Result<()> {
    let analysis = analyze(config, input).await?;

    let raw: Vec<RawScene> = match scenes {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SegmentPlanner {
            min_scene_seconds: config.timeline.min_scene_seconds,
            max_scene_seconds: config.timeline.default_scene_seconds,
        }
        .plan(&analysis)?,
    };

    let mut model = TimelineModel::new(config.timeline);
    model.set_analysis(analysis.into());
    model.load_raw(raw);

    for (index, scene) in model.scenes().iter().enumerate() {
        println!(
            "{index:>3}  {}  {:<8} {:<10} {}",
            scene.time_range,
            format!("{:?}", scene.transition),
            format!("{:?}", scene.status),
            scene.visual_description
        );
    }

    if let Some(width_px) = render_width {
        let viewport = Viewport::new(model.duration(), 1.0, 0.0);
        let commands = render(&RenderState {
            model: &model,
            viewport: &viewport,
            interaction: InteractionState::Idle,
            config: &config.interaction,
            width_px,
        });
        println!("{}", serde_json::to_string_pretty(&commands)?);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-driven scene timeline tools", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a WAV file and print the energy segments and peaks as JSON.
    Analyze {
        /// Path to the audio file that should be analysed.
        input: PathBuf,
        /// Write the analysis here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyse a WAV file and lay out an initial scene timeline.
    Plan {
        /// Path to the audio file that should be analysed.
        input: PathBuf,
        /// Planner output (JSON list of raw scenes). Defaults to one scene
        /// per energy segment.
        #[arg(short, long)]
        scenes: Option<PathBuf>,
        /// Also print the draw list for a timeline this many pixels wide.
        #[arg(long)]
        render_width: Option<f64>,
    },
}
