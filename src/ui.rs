//! Layout and drawing: arena canvas, pieces, game-over line, sidebar, pause and game over.

use crate::engine::config::Arena;
use crate::engine::geometry::Geometry;
use crate::engine::physics::{PhysicsWorld, Vec2};
use crate::engine::piece::Piece;
use crate::engine::score::unlock_threshold;
use crate::engine::session::{GameSession, GameState};
use crate::overlay::{BURST_LIFETIME, Overlay};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as Segment};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::time::Duration;
use tachyonfx::{Duration as TfxDuration, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 26;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
/// Inner outline scale, gives pieces a neon double stroke.
const INNER_STROKE: f64 = 0.55;
const DASH: f64 = 12.0;

/// Everything `draw` reads from the running game.
pub struct Scene<'a> {
    pub session: &'a GameSession,
    pub world: &'a dyn PhysicsWorld,
    pub theme: &'a Theme,
    pub music_on: bool,
}

/// Board rectangle (with border) and sidebar rectangle, centred in `area`, keeping the arena's
/// aspect ratio.
pub fn layout(area: Rect, arena: &Arena) -> (Rect, Rect) {
    let aspect = arena.width / arena.height * CELL_ASPECT;
    let max_inner_w = area.width.saturating_sub(2 + SIDEBAR_WIDTH);
    let mut inner_h = area.height.saturating_sub(2);
    let mut inner_w = (f64::from(inner_h) * aspect).round() as u16;
    if inner_w > max_inner_w {
        inner_w = max_inner_w;
        inner_h = ((f64::from(inner_w) / aspect).round() as u16).min(area.height.saturating_sub(2));
    }
    let board_w = inner_w + 2;
    let board_h = inner_h + 2;
    let total_w = (board_w + SIDEBAR_WIDTH).min(area.width);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(board_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_w), Constraint::Min(0)])
        .split(vert[1]);
    (parts[0], parts[1])
}

/// Terminal cell under an arena point, clamped into `inner`.
pub fn arena_to_cell(inner: Rect, arena: &Arena, p: Vec2) -> Position {
    let u = (p.x / arena.width).clamp(0.0, 1.0);
    let v = (p.y / arena.height).clamp(0.0, 1.0);
    let x = (u * f64::from(inner.width)) as u16;
    let y = (v * f64::from(inner.height)) as u16;
    Position {
        x: inner.x + x.min(inner.width.saturating_sub(1)),
        y: inner.y + y.min(inner.height.saturating_sub(1)),
    }
}

pub fn draw(frame: &mut Frame, scene: &Scene, overlay: &mut Overlay, delta: Duration) {
    let area = frame.area();
    let arena = scene.session.config().arena;
    let (board, sidebar) = layout(area, &arena);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(scene.theme.div_line).bg(scene.theme.bg))
        .title(Span::styled(" neondrop ", Style::default().fg(scene.theme.title)));
    let inner = block.inner(board);

    draw_arena(frame, scene, overlay, board, block);
    apply_burst_effects(frame, scene, overlay, inner, delta);
    if let Some(banner) = &overlay.banner {
        let row = Rect { height: 1, ..inner };
        Paragraph::new(Line::from(Span::styled(
            banner.text.as_str(),
            Style::default().fg(scene.theme.title).bold(),
        )))
        .alignment(Alignment::Center)
        .render(row, frame.buffer_mut());
    }
    draw_sidebar(frame, scene, sidebar);

    match scene.session.state() {
        GameState::Active => {}
        GameState::Paused => draw_pause_overlay(frame, scene.theme, board),
        GameState::GameOver => draw_game_over(frame, scene, board),
    }
}

fn draw_arena(frame: &mut Frame, scene: &Scene, overlay: &Overlay, area: Rect, block: Block) {
    let config = scene.session.config();
    let (w, h) = (config.arena.width, config.arena.height);
    let theme = scene.theme;
    let line_y = h - config.game_over_y();

    let canvas = Canvas::default()
        .block(block)
        .background_color(theme.bg)
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(|ctx| {
            let mut x = 0.0;
            while x < w {
                ctx.draw(&Segment {
                    x1: x,
                    y1: line_y,
                    x2: (x + DASH).min(w),
                    y2: line_y,
                    color: theme.danger,
                });
                x += DASH * 2.0;
            }
            ctx.layer();

            for piece in scene.session.pieces() {
                draw_piece(ctx, scene.world, piece, theme.piece_color(piece.color), h);
            }
            ctx.layer();

            for burst in &overlay.bursts {
                ctx.draw(&Circle {
                    x: burst.center.x,
                    y: h - burst.center.y,
                    radius: burst.radius().max(1.0),
                    color: burst_color(theme, burst.color),
                });
            }
            for label in &overlay.labels {
                let at = label.position();
                let color = label.color.map_or(theme.title, |c| theme.piece_color(c));
                ctx.print(
                    at.x,
                    h - at.y,
                    Span::styled(label.text.clone(), Style::default().fg(color).bold()),
                );
            }
        });
    canvas.render(area, frame.buffer_mut());
}

fn draw_piece(ctx: &mut Context, world: &dyn PhysicsWorld, piece: &Piece, color: Color, h: f64) {
    let Some(center) = world.position(piece.handle) else {
        return;
    };
    if let Geometry::Circle { radius } = piece.geometry {
        for r in [radius, radius * INNER_STROKE] {
            ctx.draw(&Circle {
                x: center.x,
                y: h - center.y,
                radius: r,
                color,
            });
        }
        return;
    }
    let angle = world.angle(piece.handle).unwrap_or(0.0);
    let outline = piece.geometry.outline(0);
    for scale in [1.0, INNER_STROKE] {
        let points: Vec<Vec2> = outline
            .iter()
            .map(|v| center + Vec2::new(v.x * scale, v.y * scale).rotated(angle))
            .collect();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            ctx.draw(&Segment {
                x1: a.x,
                y1: h - a.y,
                x2: b.x,
                y2: h - b.y,
                color,
            });
        }
    }
}

fn burst_color(theme: &Theme, color: Option<u8>) -> Color {
    color.map_or(theme.danger, |c| theme.piece_color(c))
}

/// Flash the cells around each burst in its colour, fading back over the burst lifetime.
fn apply_burst_effects(
    frame: &mut Frame,
    scene: &Scene,
    overlay: &mut Overlay,
    inner: Rect,
    delta: Duration,
) {
    let arena = scene.session.config().arena;
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    for burst in &mut overlay.bursts {
        let reach = Vec2::new(36.0, 36.0);
        let top_left = arena_to_cell(
            inner,
            &arena,
            Vec2::new(burst.center.x - reach.x, burst.center.y - reach.y),
        );
        let bottom_right = arena_to_cell(inner, &arena, burst.center + reach);
        let rect = Rect {
            x: top_left.x,
            y: top_left.y,
            width: bottom_right.x - top_left.x + 1,
            height: bottom_right.y - top_left.y + 1,
        };
        let color = burst_color(scene.theme, burst.color);
        let effect = burst.effect.get_or_insert_with(|| {
            fx::fade_from_fg(
                color,
                (BURST_LIFETIME.as_millis() as u32, Interpolation::QuadOut),
            )
            .with_area(rect)
        });
        frame.render_effect(effect, rect, tfx_delta);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, scene: &Scene, area: Rect) {
    let theme = scene.theme;
    let popup = centered(area, 30, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(theme.danger),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", scene.session.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Colours: {} ", scene.session.unlocked_colors()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " R Restart    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" neondrop ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

/// Render a bordered block and return its inner area.
fn bordered(frame: &mut Frame, outer: Rect, border_style: Style) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());
    inner
}

/// Progress from the previous unlock threshold to the next, for the sidebar gauge.
fn unlock_progress(session: &GameSession) -> Option<(f64, u32)> {
    let next = session.next_unlock_at()?;
    let step = session.unlocked_colors() - session.config().initial_colors;
    let previous = step.checked_sub(1).map_or(0, unlock_threshold);
    let span = f64::from(next - previous);
    let done = f64::from(session.score().saturating_sub(previous));
    Some(((done / span).clamp(0.0, 1.0), next))
}

fn draw_sidebar(frame: &mut Frame, scene: &Scene, area: Rect) {
    let theme = scene.theme;
    let session = scene.session;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Score
            Constraint::Length(5), // Colours + unlock gauge
            Constraint::Length(5), // Status
            Constraint::Min(0),    // Controls
        ])
        .split(area);

    let score_inner = bordered(frame, chunks[0], border_style);
    Paragraph::new(vec![
        Line::from(Span::styled("Score", title_style)),
        Line::from(Span::styled(
            format!("{:.0}", session.displayed_score()),
            fg_style.bold(),
        )),
    ])
    .render(score_inner, frame.buffer_mut());

    let colours_inner = bordered(frame, chunks[1], border_style);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(colours_inner);
    Paragraph::new(Line::from(Span::styled("Colours", title_style)))
        .render(rows[0], frame.buffer_mut());
    let strip: Vec<Span> = (0..session.config().palette_size)
        .map(|i| {
            if i < session.unlocked_colors() {
                Span::styled("● ", Style::default().fg(theme.piece_color(i as u8)))
            } else {
                Span::styled("· ", Style::default().fg(theme.inactive_fg))
            }
        })
        .collect();
    Paragraph::new(Line::from(strip)).render(rows[1], frame.buffer_mut());
    match unlock_progress(session) {
        Some((ratio, next)) => Gauge::default()
            .ratio(ratio)
            .label(format!("next at {next}"))
            .gauge_style(Style::default().fg(theme.title).bg(theme.bg))
            .render(rows[2], frame.buffer_mut()),
        None => Paragraph::new(Line::from(Span::styled("all unlocked", fg_style)))
            .render(rows[2], frame.buffer_mut()),
    }

    let status_inner = bordered(frame, chunks[2], border_style);
    let state = match session.state() {
        GameState::Active => "playing",
        GameState::Paused => "paused",
        GameState::GameOver => "game over",
    };
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("State: ", title_style),
            Span::styled(state, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Pieces: ", title_style),
            Span::styled(session.board_len().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Music: ", title_style),
            Span::styled(if scene.music_on { "on" } else { "off" }, fg_style),
        ]),
    ])
    .render(status_inner, frame.buffer_mut());

    let controls_inner = bordered(frame, chunks[3], border_style);
    let hint = Style::default().fg(theme.inactive_fg);
    let mut controls = vec![
        Line::from(Span::styled("Controls", title_style)),
        Line::from(Span::styled("←/→  slide", hint)),
        Line::from(Span::styled("↑/↓  spin", hint)),
    ];
    if session.config().pausable {
        controls.push(Line::from(Span::styled("p    pause", hint)));
    }
    controls.extend([
        Line::from(Span::styled("r    restart", hint)),
        Line::from(Span::styled("m    music", hint)),
        Line::from(Span::styled("q    quit", hint)),
    ]);
    Paragraph::new(controls).render(controls_inner, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SessionConfig;
    use crate::engine::testing::FakeWorld;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn arena() -> Arena {
        Arena {
            width: 420.0,
            height: 640.0,
        }
    }

    #[test]
    fn test_layout_fits_and_keeps_aspect() {
        let area = Rect::new(0, 0, 120, 40);
        let (board, sidebar) = layout(area, &arena());
        assert_eq!(board.height, 40);
        // 38 rows * 2 * 420/640 ≈ 50 columns inside the border.
        assert_eq!(board.width, 52);
        assert_eq!(sidebar.x, board.x + board.width);
        assert!(sidebar.x + sidebar.width <= area.width);
    }

    #[test]
    fn test_layout_shrinks_on_narrow_terminal() {
        let area = Rect::new(0, 0, 60, 50);
        let (board, _) = layout(area, &arena());
        assert!(board.width + SIDEBAR_WIDTH <= 60);
        assert!(board.height < 50);
    }

    #[test]
    fn test_arena_to_cell_corners() {
        let inner = Rect::new(1, 1, 50, 38);
        assert_eq!(arena_to_cell(inner, &arena(), Vec2::ZERO), Position { x: 1, y: 1 });
        assert_eq!(
            arena_to_cell(inner, &arena(), Vec2::new(420.0, 640.0)),
            Position { x: 50, y: 38 }
        );
        assert_eq!(
            arena_to_cell(inner, &arena(), Vec2::new(-30.0, 900.0)),
            Position { x: 1, y: 38 }
        );
    }

    #[test]
    fn test_draws_sidebar_and_game_over() {
        let mut world = FakeWorld::new();
        let mut session = GameSession::new(SessionConfig::default(), 3);
        session.start(Duration::ZERO, &mut world);
        session.try_spawn(&mut world);
        let theme = Theme::default();
        let mut overlay = Overlay::new();
        for event in session.drain_events() {
            overlay.apply(&event);
        }
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let scene = Scene {
            session: &session,
            world: &world,
            theme: &theme,
            music_on: false,
        };
        terminal
            .draw(|f| draw(f, &scene, &mut overlay, Duration::from_millis(16)))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Score"));
        assert!(text.contains("Colours"));
        assert!(!text.contains("Game Over"));
    }
}
