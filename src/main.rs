use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};

use glyphscape::assets::{AssetProvider, DirectoryAssets, GlyphLibrary, SyntheticAssets};
use glyphscape::catalog::SpriteCatalog;
use glyphscape::config::SceneConfig;
use glyphscape::driver::FrameDriver;
use glyphscape::session::{ScrollDirection, Session};
use glyphscape::sink::{FrameSink, HttpSink, JsonLinesSink, StdoutSink};
use glyphscape::snapshot::{export_png, export_text, FrameInfo};
use glyphscape::viewer;

#[derive(Parser, Debug)]
#[command(name = "glyphscape")]
#[command(about = "Endless side-scrolling isometric landscape drawn in text glyphs")]
struct Args {
    /// JSON configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "glyphscape.json")]
    config: PathBuf,

    /// World seed (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output width in glyphs
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Output height in glyphs
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Starting camera offset in world columns
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<i64>,

    /// Sprite catalog JSON (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory of sprite images, laid out as <biome>/<name>.png.
    /// Without it, procedural silhouettes are used.
    #[arg(long)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Scroll continuously and emit frames to a sink
    Stream {
        /// Frames per second
        #[arg(long, default_value = "10")]
        fps: f64,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<usize>,

        /// Initial scroll direction (left, right or stop)
        #[arg(short, long, default_value = "right")]
        direction: ScrollDirection,

        /// Where frames go
        #[arg(long, value_enum, default_value = "stdout")]
        sink: SinkKind,

        /// Display endpoint for the http sink
        #[arg(long, default_value = "http://127.0.0.1:8000/frames")]
        url: String,
    },
    /// Render a single frame
    Render {
        /// Write the frame as text with a header
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the frame as a PNG
        #[arg(long)]
        png: Option<PathBuf>,
    },
    /// Interactive terminal viewer
    View {
        /// Milliseconds between scroll steps
        #[arg(long, default_value = "100")]
        tick_ms: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SinkKind {
    Stdout,
    Jsonl,
    Http,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = SceneConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }
    if let Some(width) = args.width {
        config.canvas.ascii_width = width;
    }
    if let Some(height) = args.height {
        config.canvas.ascii_height = height;
    }
    if let Some(offset) = args.offset {
        config.world.start_offset = offset;
    }

    let catalog = match &args.catalog {
        Some(path) => SpriteCatalog::from_json_file(path)?,
        None => SpriteCatalog::builtin(),
    };

    let cell = config.canvas.cell();
    let provider: Box<dyn AssetProvider> = match &args.assets {
        Some(dir) => Box::new(DirectoryAssets::new(dir, config.glyph.invert_source)),
        None => Box::new(SyntheticAssets::new(cell)),
    };
    let start = Instant::now();
    let library = GlyphLibrary::compile(&catalog, provider.as_ref(), cell, &config.glyph);
    log::info!("compiled glyphs in {:.2?}", start.elapsed());

    let seed = config.world.seed;
    log::info!(
        "seed {} | {}x{} glyphs | start offset {}",
        seed,
        config.canvas.ascii_width,
        config.canvas.ascii_height,
        config.world.start_offset
    );

    let mut driver = FrameDriver::new(&config, Arc::new(catalog), library);
    let mut session = Session::new(&config.world);

    match args.command.unwrap_or(Mode::Render { out: None, png: None }) {
        Mode::Stream {
            fps,
            frames,
            direction,
            sink,
            url,
        } => {
            let mut sink: Box<dyn FrameSink> = match sink {
                SinkKind::Stdout => Box::new(StdoutSink::new(true)),
                SinkKind::Jsonl => Box::new(JsonLinesSink::new(std::io::stdout())),
                SinkKind::Http => Box::new(HttpSink::new(url, Duration::from_secs(2), Duration::from_secs(5))?),
            };
            session.set_direction(direction);
            let frame_time = Duration::from_secs_f64(1.0 / fps.max(0.1));
            let mut emitted = 0usize;
            let mut ticks = 0usize;

            while frames.map_or(true, |limit| ticks < limit) {
                let started = Instant::now();
                let report = driver.tick(&mut session, sink.as_mut());
                ticks += 1;
                if report.emitted {
                    emitted += 1;
                }
                log::debug!(
                    "tick {} at offset {} ({}, {:.1}C)",
                    ticks,
                    report.offset,
                    report.biome,
                    report.temperature
                );
                thread::sleep(frame_time.saturating_sub(started.elapsed()));
            }
            log::info!("emitted {emitted} of {ticks} frames");
            log::info!("{}", driver.cache_stats().summary());
        }
        Mode::Render { out, png } => {
            let offset = session.camera().offset;
            let frame = driver.render_frame(offset);
            let info = FrameInfo {
                seed,
                offset,
                biome: driver.biome(offset),
                temperature: driver.temperature(offset),
            };
            if let Some(path) = &png {
                export_png(&frame, cell, path)?;
            }
            if let Some(path) = &out {
                export_text(&frame, &info, path)?;
            }
            if png.is_none() && out.is_none() {
                println!("{}", frame.to_text());
            }
        }
        Mode::View { tick_ms } => {
            viewer::run_viewer(driver, session, seed, Duration::from_millis(tick_ms.max(1)))?;
        }
    }

    Ok(())
}
