//! Neondrop: drop neon shapes into a physics arena and clear same-colour clusters.

mod app;
mod engine;
mod input;
mod overlay;
mod sound;
mod theme;
mod ui;
mod world;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use engine::cluster::Connectivity;
use engine::config::{Arena, PALETTE_SIZE, PieceSize, SessionConfig};
use engine::score::ClearBonus;
use sound::SoundBoard;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }

    let config = args.session_config();
    config.validate()?;

    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(e) => {
            warn!(error = %e, "theme unreadable, using neon defaults");
            theme::Theme::default()
        }
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, ?config, "starting");

    let sound = SoundBoard::new(args.sound.into(), args.music.into());
    let mut app = App::new(config, seed, theme, sound);
    app.run()?;
    Ok(())
}

/// Log to a file; the terminal belongs to the TUI. `RUST_LOG` overrides the default filter.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("neondrop=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Neon falling-shape matching game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "neondrop",
    version,
    about = "Neon falling-shape matching game in the terminal. Shapes tumble into a physics arena; touch five of a colour to clear them.",
    long_about = "Neondrop drops random neon shapes into a walled arena with real 2D physics.\n\n\
        Steer the falling shape while it drops. Once it lands it joins the pile. Five or more \
        touching shapes of the same colour explode for points, and a crowded floor is swept \
        automatically. The game ends when the pile reaches the dashed line.\n\n\
        CONTROLS:\n  Left/Right or h/l  Slide      Up/k  Spin clockwise   Down/j  Spin anticlockwise\n  \
        P  Pause      R  Restart      M  Music on/off      Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme; piece colours are keys color0 to color9."
)]
pub struct Args {
    /// Colours in play at the start; more unlock as the score grows.
    #[arg(short, long, default_value_t = 4, value_name = "N",
          value_parser = clap::value_parser!(u8).range(2..=PALETTE_SIZE as i64))]
    pub colors: u8,

    /// Target area of each falling shape.
    #[arg(short, long, default_value = "medium")]
    pub piece_size: PieceSizeArg,

    /// How close two shapes must be to count as touching.
    #[arg(long, default_value = "gap")]
    pub connectivity: ConnectivityArg,

    /// Cluster bonus: fixed, or scaled by cluster size.
    #[arg(long, default_value = "scaled")]
    pub clear_bonus: ClearBonusArg,

    /// Sound effects.
    #[arg(long, default_value = "on")]
    pub sound: Switch,

    /// Background music (toggle in game with M).
    #[arg(long, default_value = "off")]
    pub music: Switch,

    /// Disable pausing.
    #[arg(long)]
    pub no_pause: bool,

    /// Seed for shape, colour and bonus rolls. Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the neon palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Write logs to this file. RUST_LOG filters; default neondrop=debug.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Arena width in simulation units.
    #[arg(long, default_value_t = 420.0, value_name = "UNITS")]
    pub arena_width: f64,

    /// Arena height in simulation units.
    #[arg(long, default_value_t = 640.0, value_name = "UNITS")]
    pub arena_height: f64,
}

impl Args {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            arena: Arena {
                width: self.arena_width,
                height: self.arena_height,
            },
            piece_area: PieceSize::from(self.piece_size).target_area(),
            initial_colors: usize::from(self.colors),
            connectivity: self.connectivity.into(),
            clear_bonus: self.clear_bonus.into(),
            pausable: !self.no_pause,
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PieceSizeArg {
    Small,
    #[default]
    Medium,
    Large,
    #[value(alias = "xl")]
    Xlarge,
}

impl From<PieceSizeArg> for PieceSize {
    fn from(arg: PieceSizeArg) -> Self {
        match arg {
            PieceSizeArg::Small => Self::Small,
            PieceSizeArg::Medium => Self::Medium,
            PieceSizeArg::Large => Self::Large,
            PieceSizeArg::Xlarge => Self::XLarge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConnectivityArg {
    /// Edge gap under 50 units.
    #[default]
    Gap,
    /// Centres within the mean bounding extent plus 5 units.
    Bounds,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Gap => Self::DEFAULT_GAP,
            ConnectivityArg::Bounds => Self::DEFAULT_BOUNDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ClearBonusArg {
    Fixed,
    #[default]
    Scaled,
}

impl From<ClearBonusArg> for ClearBonus {
    fn from(arg: ClearBonusArg) -> Self {
        match arg {
            ClearBonusArg::Fixed => Self::Fixed,
            ClearBonusArg::Scaled => Self::Scaled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(s: Switch) -> Self {
        s == Switch::On
    }
}
