use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use alchemy_shapes_core::{
    render_svg, FileStore, Frame, InputEvent, KeyValueStore, StylePersistence, SvgSurface,
    TransitionKind, VisualStyle, Widget, WidgetConfig,
};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

type HostWidget = Widget<FileStore, SvgSurface, StdRng>;

fn main() -> alchemy_shapes_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            host,
            auto,
            duration_ms,
            realtime,
            randomize,
        } => run_live(&host, auto, duration_ms, realtime, randomize),
        Commands::Replay { script, host } => run_replay(&script, &host),
        Commands::Show { state_dir, config, output } => {
            run_show(&state_dir, config.as_deref(), output.as_deref())
        }
        Commands::Reset { state_dir, config } => run_reset(&state_dir, config.as_deref()),
    }
}

fn run_live(
    host: &HostArgs,
    auto: bool,
    duration_ms: u64,
    realtime: bool,
    randomize: bool,
) -> alchemy_shapes_core::Result<()> {
    tracing::info!(auto, duration_ms, realtime, "starting widget");

    let mut widget = mount(host)?;
    if auto {
        widget.start_auto_cycle();
    }
    if randomize {
        widget.trigger(TransitionKind::Randomize);
    }

    let mut frames_seen = widget.surface().frames_rendered();
    let started = Instant::now();
    while widget.now() < duration_ms {
        let next = widget
            .next_deadline()
            .unwrap_or(duration_ms)
            .min(duration_ms);
        if realtime {
            let target = started + Duration::from_millis(next);
            std::thread::sleep(target.saturating_duration_since(Instant::now()));
        }
        widget.advance_to(next);

        if widget.surface().frames_rendered() != frames_seen {
            frames_seen = widget.surface().frames_rendered();
            log_frame(&widget.frame());
        }
    }

    finish(widget, host.svg_out.as_deref())
}

/// One scripted input, applied when the widget clock reaches `at_ms`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptStep {
    at_ms: u64,
    event: InputEvent,
}

fn run_replay(script: &Path, host: &HostArgs) -> alchemy_shapes_core::Result<()> {
    let content = std::fs::read_to_string(script)?;
    let mut steps: Vec<ScriptStep> = serde_json::from_str(&content)?;
    steps.sort_by_key(|step| step.at_ms);
    tracing::info!(?script, steps = steps.len(), "replaying input script");

    let mut widget = mount(host)?;
    for step in steps {
        widget.advance_to(step.at_ms);
        tracing::debug!(at_ms = step.at_ms, event = ?step.event, "input");
        widget.handle_input(step.event);
        log_frame(&widget.frame());
    }
    widget.stop_auto_cycle();
    widget.settle();
    log_frame(&widget.frame());

    finish(widget, host.svg_out.as_deref())
}

fn run_show(
    state_dir: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
) -> alchemy_shapes_core::Result<()> {
    let config = load_config(config)?;
    let colors = config.palette.build()?;
    let defaults = VisualStyle::initial(colors.palette());
    let persistence = StylePersistence::new(FileStore::new(state_dir), config.storage_key);

    let (shape, style) = match persistence.load(&defaults) {
        Some(record) => (record.shape, record.style),
        None => {
            tracing::info!("nothing saved yet, showing the default shape");
            (Default::default(), defaults)
        }
    };
    let frame = Frame::new(0, shape, shape, style, Default::default(), false);
    write_svg(&render_svg(&frame), output)
}

fn run_reset(state_dir: &Path, config: Option<&Path>) -> alchemy_shapes_core::Result<()> {
    let config = load_config(config)?;
    let mut store = FileStore::new(state_dir);
    store.remove(&config.storage_key)?;
    tracing::info!(?state_dir, "cleared saved style");
    Ok(())
}

fn mount(host: &HostArgs) -> alchemy_shapes_core::Result<HostWidget> {
    let config = load_config(host.config.as_deref())?;
    let rng = match host.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Widget::mount(
        &config,
        FileStore::new(&host.state_dir),
        SvgSurface::new(),
        rng,
    )
}

fn finish(widget: HostWidget, svg_out: Option<&Path>) -> alchemy_shapes_core::Result<()> {
    let detached = widget.unmount();
    if let Some(path) = svg_out {
        if let Some(document) = detached.surface.document() {
            write_svg(document, Some(path))?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> alchemy_shapes_core::Result<WidgetConfig> {
    match path {
        Some(path) => WidgetConfig::from_json_file(path),
        None => Ok(WidgetConfig::default()),
    }
}

fn write_svg(document: &str, output: Option<&Path>) -> alchemy_shapes_core::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, document)?;
            tracing::info!(?path, "wrote svg");
        }
        None => print!("{document}"),
    }
    Ok(())
}

fn log_frame(frame: &Frame) {
    tracing::info!(
        at_ms = frame.at_ms,
        phase = frame.phase.name(),
        shape = %frame.shape,
        fill = %frame.style.fill,
        border = %frame.style.border_color,
        size = frame.style.size,
        rotation = frame.style.display_rotation(),
        scale = frame.style.scale,
        "frame"
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Shape-shifting alchemy widget", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that mounts the widget.
#[derive(Args, Debug)]
struct HostArgs {
    /// Directory holding the saved style.
    #[arg(long, default_value = ".alchemy")]
    state_dir: PathBuf,
    /// Optional JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for reproducible shapes and styles.
    #[arg(long)]
    seed: Option<u64>,
    /// Write the last frame as SVG to this path.
    #[arg(long)]
    svg_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mount the widget and let its timers run.
    Run {
        #[command(flatten)]
        host: HostArgs,
        /// Start the auto-cycle right away.
        #[arg(short, long)]
        auto: bool,
        /// How long to run, in widget milliseconds.
        #[arg(long, default_value_t = 10_000)]
        duration_ms: u64,
        /// Follow the wall clock instead of jumping between timers.
        #[arg(long)]
        realtime: bool,
        /// Trigger one randomization on startup.
        #[arg(long)]
        randomize: bool,
    },
    /// Feed a JSON list of `{ "atMs": .., "event": .. }` inputs to the widget.
    Replay {
        /// Path to the input script.
        script: PathBuf,
        #[command(flatten)]
        host: HostArgs,
    },
    /// Render the saved shape as SVG.
    Show {
        #[arg(long, default_value = ".alchemy")]
        state_dir: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output path; standard output when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Forget the saved shape.
    Reset {
        #[arg(long, default_value = ".alchemy")]
        state_dir: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
