//! App: terminal init, main loop, physics stepping, event routing and key handling.

use crate::engine::config::SessionConfig;
use crate::engine::events::GameEvent;
use crate::engine::physics::PhysicsWorld;
use crate::engine::session::{GameSession, VelocityCommand};
use crate::input::{Action, key_to_action};
use crate::overlay::Overlay;
use crate::sound::{Cue, SoundBoard};
use crate::theme::Theme;
use crate::ui::{self, Scene};
use crate::world::{self, RapierWorld};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::info;

/// Target frame time, ~60 FPS.
const FRAME: Duration = Duration::from_millis(16);
/// Longest frame delta fed to the simulation; anything beyond is dropped after a stall.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: GameSession,
    world: RapierWorld,
    overlay: Overlay,
    sound: SoundBoard,
    theme: Theme,
    /// Session clock: frame time accumulated since start.
    clock: Duration,
    /// Wall time not yet consumed by fixed physics steps.
    physics_lag: Duration,
}

impl App {
    pub fn new(config: SessionConfig, seed: u64, theme: Theme, sound: SoundBoard) -> Self {
        let mut world = RapierWorld::new(&config.arena);
        let mut session = GameSession::new(config, seed);
        session.start(Duration::ZERO, &mut world);
        Self {
            session,
            world,
            overlay: Overlay::new(),
            sound,
            theme,
            clock: Duration::ZERO,
            physics_lag: Duration::ZERO,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        // Release events let held keys be told apart from OS repeats.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        info!(score = self.session.score(), "exited");
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut last = Instant::now();
        loop {
            let now = Instant::now();
            let delta = now.duration_since(last);
            last = now;
            self.update(delta);

            let scene = Scene {
                session: &self.session,
                world: &self.world,
                theme: &self.theme,
                music_on: self.sound.music_on(),
            };
            let overlay = &mut self.overlay;
            terminal.draw(|f| ui::draw(f, &scene, overlay, delta))?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_action(key_to_action(key)) == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Advance one frame: fixed physics steps, collision dispatch, schedules, presentation.
    pub fn update(&mut self, delta: Duration) {
        let delta = delta.min(MAX_FRAME_DELTA);
        self.clock += delta;
        if !self.session.is_paused() {
            self.physics_lag += delta;
            while self.physics_lag >= world::STEP {
                self.physics_lag -= world::STEP;
                self.world.step();
                let pairs = self.world.drain_collisions();
                if !pairs.is_empty() {
                    self.session.handle_collisions(&pairs, &mut self.world);
                }
            }
        }
        self.session.advance(self.clock, &mut self.world);
        self.session.tick_presentation();
        self.overlay.tick(delta);
        self.route_events();
    }

    fn route_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                GameEvent::Settled { .. } => self.sound.play(Cue::Collision),
                GameEvent::ClusterCleared { .. } | GameEvent::OverflowCleared { .. } => {
                    self.sound.play(Cue::Explosion);
                }
                _ => {}
            }
            self.overlay.apply(&event);
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Flow {
        let config = self.session.config();
        let (slide, spin) = (config.slide_speed, config.spin_speed);
        match action {
            Action::Quit => return Flow::Quit,
            Action::SlideLeft => {
                self.session
                    .command(VelocityCommand::Slide(-slide), &mut self.world);
            }
            Action::SlideRight => {
                self.session
                    .command(VelocityCommand::Slide(slide), &mut self.world);
            }
            Action::SpinCw => {
                self.session
                    .command(VelocityCommand::Spin(spin), &mut self.world);
            }
            Action::SpinCcw => {
                self.session
                    .command(VelocityCommand::Spin(-spin), &mut self.world);
            }
            Action::Pause => {
                self.session.toggle_pause(&mut self.world);
            }
            Action::Restart => {
                self.session.restart(self.clock, &mut self.world);
                self.physics_lag = Duration::ZERO;
            }
            Action::ToggleMusic => {
                let on = self.sound.toggle_music();
                info!(on, "music toggled");
            }
            Action::None => {}
        }
        self.route_events();
        Flow::Continue
    }
}
