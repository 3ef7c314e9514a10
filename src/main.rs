//! Piano Tiles headless runner
//!
//! Drives the engine on the real game loop with a text surface and an
//! optional autoplay bot, then prints the session and lifetime stats.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use rand::Rng;

use piano_tiles::consts::TARGET_FPS;
use piano_tiles::feedback::LogFeedback;
use piano_tiles::persistence::BestScoreFile;
use piano_tiles::platform::{GameLoop, TouchOutcome, dispatch_touch};
use piano_tiles::renderer::TextSurface;
use piano_tiles::stats::JsonStatsStore;
use piano_tiles::{Difficulty, GameEngine, GameState, SessionConfig};

/// How often the bot looks at the board
const BOT_POLL: Duration = Duration::from_millis(8);

#[derive(Debug, Parser)]
#[command(name = "piano-tiles")]
#[command(about = "Falling-tile rhythm game, headless", long_about = None)]
struct Cli {
    /// Session config file (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config back to --config
    #[arg(long, requires = "config")]
    save_config: bool,

    /// Number of lanes (3-6)
    #[arg(short, long)]
    lanes: Option<usize>,

    /// easy, normal or hard
    #[arg(short, long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// Lock spawns to this tempo (enables beat mode)
    #[arg(long)]
    bpm: Option<f32>,

    /// Seeded lane pattern (enables pattern mode, 0 = random seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for random lane selection outside pattern mode
    #[arg(long)]
    spawn_seed: Option<u64>,

    #[arg(long)]
    haptics: Option<bool>,

    #[arg(long)]
    sound: Option<bool>,

    /// Stop after this many seconds even if the session is still running
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Where best score and stats are kept
    #[arg(long, default_value = "piano-tiles-data")]
    data_dir: PathBuf,

    /// Print every Nth frame
    #[arg(long, default_value_t = 30)]
    render_every: u32,

    /// Surface width in pixels
    #[arg(long, default_value_t = 720)]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 1280)]
    height: u32,

    /// Pixels per dp
    #[arg(long, default_value_t = 2.0)]
    density: f32,

    /// Let a bot play
    #[arg(long)]
    autoplay: bool,

    /// Chance (0-1) the bot lets a tile through on each look
    #[arg(long, default_value_t = 0.02)]
    miss_rate: f64,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

impl Cli {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut cfg = match &self.config {
            Some(path) if path.exists() => SessionConfig::load(path)
                .with_context(|| format!("failed to load config: {}", path.display()))?,
            _ => SessionConfig::default(),
        };

        if let Some(difficulty) = self.difficulty {
            cfg.apply_difficulty(difficulty);
        }
        if let Some(lanes) = self.lanes {
            cfg.lane_count = lanes;
        }
        if let Some(bpm) = self.bpm {
            cfg.beat_mode = true;
            cfg.bpm = bpm;
        }
        if let Some(seed) = self.seed {
            cfg.pattern_mode = true;
            cfg.pattern_seed = seed;
        }
        if let Some(haptics) = self.haptics {
            cfg.haptics_enabled = haptics;
        }
        if let Some(sound) = self.sound {
            cfg.sound_enabled = sound;
        }
        Ok(cfg.sanitized())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = cli.session_config()?;
    if let (true, Some(path)) = (cli.save_config, &cli.config) {
        cfg.save(path)
            .with_context(|| format!("failed to save config: {}", path.display()))?;
    }

    let stats_path = cli.data_dir.join("stats.json");
    let stats = JsonStatsStore::open(&stats_path)
        .with_context(|| format!("failed to open stats: {}", stats_path.display()))?;

    let mut engine = GameEngine::new(
        Box::new(BestScoreFile::new(cli.data_dir.join("best.json"))),
        Box::new(stats),
    )
    .with_feedback(Box::new(LogFeedback::default()));
    if let Some(seed) = cli.spawn_seed {
        engine = engine.with_spawn_seed(seed);
    }
    engine.set_density(cli.density);
    engine.on_size_changed(cli.width, cli.height);
    engine.apply_config(&cfg);
    let engine = Arc::new(engine);

    log::info!("Piano Tiles starting ({} lanes)", cfg.lane_count);

    let game_loop = GameLoop::spawn(
        engine.clone(),
        TextSurface::stdout(cli.render_every),
        TARGET_FPS,
    )
    .context("failed to start game loop")?;

    let bot_stop = Arc::new(AtomicBool::new(false));
    let bot = cli
        .autoplay
        .then(|| spawn_bot(engine.clone(), bot_stop.clone(), cli.miss_rate, cli.density))
        .transpose()
        .context("failed to start autoplay bot")?;

    let deadline = Instant::now() + Duration::from_secs(cli.seconds);
    while Instant::now() < deadline && engine.state() != GameState::GameOver {
        std::thread::sleep(Duration::from_millis(50));
    }

    bot_stop.store(true, Ordering::Relaxed);
    if let Some(bot) = bot {
        let _ = bot.join();
    }
    let surface = game_loop.stop().context("game loop did not shut down cleanly")?;
    engine.release();

    println!("{}", surface.last());
    print_summary(&engine, &stats_path)?;
    Ok(())
}

/// Tap every tile as its center crosses the judgement line
fn spawn_bot(
    engine: Arc<GameEngine>,
    stop: Arc<AtomicBool>,
    miss_rate: f64,
    density: f32,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("autoplay".into())
        .spawn(move || {
            let miss_rate = miss_rate.clamp(0.0, 1.0);
            let mut rng = rand::rng();
            while !stop.load(Ordering::Relaxed) {
                if let Some(frame) = engine.draw() {
                    let line = frame.judgement_line_y;
                    for tile in &frame.tiles {
                        let center = tile.top + tile.height / 2.0;
                        if !(line - 20.0..=line).contains(&center) || rng.random_bool(miss_rate) {
                            continue;
                        }
                        let x = (tile.left + tile.right) / 2.0 * density;
                        match dispatch_touch(&engine, x, center * density) {
                            TouchOutcome::Judged(j) => log::trace!("bot tap: {}", j.as_str()),
                            other => log::debug!("bot touch: {other:?}"),
                        }
                    }
                }
                std::thread::sleep(BOT_POLL);
            }
        })
}

fn print_summary(engine: &GameEngine, stats_path: &Path) -> anyhow::Result<()> {
    let snapshot = engine.score_snapshot();
    println!(
        "Session: score {} | max combo {} | best {}",
        snapshot.score, snapshot.max_combo, snapshot.best
    );

    let stats = JsonStatsStore::open(stats_path)
        .with_context(|| format!("failed to reopen stats: {}", stats_path.display()))?;
    let agg = stats.aggregates();
    println!(
        "Lifetime: {} runs | {}s played | avg {:.1} | best {}",
        agg.total_runs,
        agg.total_play_time_secs,
        agg.avg_score(),
        agg.best_score
    );
    for (rank, entry) in stats.leaderboard().iter().take(5).enumerate() {
        println!(
            "  #{:<2} {:>6}  combo {:<4} {} lanes  {}",
            rank + 1,
            entry.score,
            entry.max_combo,
            entry.lanes,
            entry.difficulty.as_str()
        );
    }
    Ok(())
}
