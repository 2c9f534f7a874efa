//! Transient presentation state: clear bursts, floating score labels and the unlock banner.
//!
//! Everything here lives in arena coordinates and ages by frame delta; `ui` turns it into
//! canvas shapes and tachyonfx effects.

use crate::engine::events::GameEvent;
use crate::engine::physics::Vec2;
use std::time::Duration;
use tachyonfx::Effect;

pub const BURST_LIFETIME: Duration = Duration::from_millis(500);
pub const LABEL_LIFETIME: Duration = Duration::from_millis(1000);
pub const BANNER_LIFETIME: Duration = Duration::from_millis(2000);
/// How far a label drifts up over its lifetime, in arena units.
const LABEL_RISE: f64 = 40.0;
/// Burst ring radius at the end of its lifetime, in arena units.
const BURST_REACH: f64 = 70.0;

/// Expanding ring where pieces were cleared.
pub struct Burst {
    pub center: Vec2,
    /// Palette index; None for colour-agnostic clears.
    pub color: Option<u8>,
    pub age: Duration,
    /// Cell fade, created on first draw once the screen area is known.
    pub effect: Option<Effect>,
}

impl Burst {
    pub fn progress(&self) -> f64 {
        (self.age.as_secs_f64() / BURST_LIFETIME.as_secs_f64()).min(1.0)
    }

    pub fn radius(&self) -> f64 {
        BURST_REACH * self.progress()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingLabel {
    pub origin: Vec2,
    pub text: String,
    pub color: Option<u8>,
    pub age: Duration,
}

impl FloatingLabel {
    /// Current position: the origin raised in proportion to age.
    pub fn position(&self) -> Vec2 {
        let t = (self.age.as_secs_f64() / LABEL_LIFETIME.as_secs_f64()).min(1.0);
        Vec2::new(self.origin.x, self.origin.y - LABEL_RISE * t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: String,
    pub age: Duration,
}

#[derive(Default)]
pub struct Overlay {
    pub bursts: Vec<Burst>,
    pub labels: Vec<FloatingLabel>,
    pub banner: Option<Banner>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to one session event.
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Scored { points, color, at } => self.labels.push(FloatingLabel {
                origin: *at,
                text: format!("+{points}"),
                color: *color,
                age: Duration::ZERO,
            }),
            GameEvent::ClusterCleared {
                color, centroid, ..
            } => self.burst(*centroid, Some(*color)),
            GameEvent::OverflowCleared { centroid, .. } => self.burst(*centroid, None),
            GameEvent::ColorsUnlocked { count } => {
                self.banner = Some(Banner {
                    text: format!("New colour! {count} in play"),
                    age: Duration::ZERO,
                });
            }
            GameEvent::Restarted => self.clear(),
            GameEvent::Spawned { .. }
            | GameEvent::Settled { .. }
            | GameEvent::Paused
            | GameEvent::Resumed
            | GameEvent::GameOver { .. } => {}
        }
    }

    fn burst(&mut self, center: Vec2, color: Option<u8>) {
        self.bursts.push(Burst {
            center,
            color,
            age: Duration::ZERO,
            effect: None,
        });
    }

    /// Age everything by `delta` and drop what has expired.
    pub fn tick(&mut self, delta: Duration) {
        self.bursts.retain_mut(|b| {
            b.age += delta;
            b.age < BURST_LIFETIME
        });
        self.labels.retain_mut(|l| {
            l.age += delta;
            l.age < LABEL_LIFETIME
        });
        if let Some(banner) = self.banner.as_mut() {
            banner.age += delta;
            if banner.age >= BANNER_LIFETIME {
                self.banner = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.bursts.clear();
        self.labels.clear();
        self.banner = None;
    }

    pub fn is_idle(&self) -> bool {
        self.bursts.is_empty() && self.labels.is_empty() && self.banner.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_scored_event_adds_label() {
        let mut overlay = Overlay::new();
        overlay.apply(&GameEvent::Scored {
            points: 137,
            color: Some(2),
            at: Vec2::new(100.0, 300.0),
        });
        assert_eq!(overlay.labels.len(), 1);
        assert_eq!(overlay.labels[0].text, "+137");
        assert_eq!(overlay.labels[0].color, Some(2));
    }

    #[test]
    fn test_label_rises_then_expires() {
        let mut overlay = Overlay::new();
        overlay.apply(&GameEvent::Scored {
            points: 5,
            color: None,
            at: Vec2::new(100.0, 300.0),
        });
        overlay.tick(ms(500));
        let p = overlay.labels[0].position();
        assert!((p.y - 280.0).abs() < 1e-9);
        overlay.tick(ms(499));
        assert_eq!(overlay.labels.len(), 1);
        overlay.tick(ms(1));
        assert!(overlay.labels.is_empty());
    }

    #[test]
    fn test_bursts_last_half_a_second() {
        let mut overlay = Overlay::new();
        overlay.apply(&GameEvent::ClusterCleared {
            color: 1,
            size: 5,
            centroid: Vec2::new(50.0, 50.0),
        });
        overlay.apply(&GameEvent::OverflowCleared {
            removed: 3,
            fill_ratio: 0.6,
            centroid: Vec2::new(80.0, 600.0),
        });
        assert_eq!(overlay.bursts.len(), 2);
        assert_eq!(overlay.bursts[1].color, None);
        overlay.tick(ms(250));
        assert!((overlay.bursts[0].radius() - BURST_REACH / 2.0).abs() < 1e-9);
        overlay.tick(ms(250));
        assert!(overlay.bursts.is_empty());
    }

    #[test]
    fn test_unlock_banner_and_restart() {
        let mut overlay = Overlay::new();
        overlay.apply(&GameEvent::ColorsUnlocked { count: 5 });
        overlay.apply(&GameEvent::Scored {
            points: 5,
            color: None,
            at: Vec2::ZERO,
        });
        assert!(overlay.banner.as_ref().is_some_and(|b| b.text.contains('5')));
        overlay.apply(&GameEvent::Restarted);
        assert!(overlay.is_idle());
    }

    #[test]
    fn test_banner_expires() {
        let mut overlay = Overlay::new();
        overlay.apply(&GameEvent::ColorsUnlocked { count: 5 });
        overlay.tick(ms(1999));
        assert!(overlay.banner.is_some());
        overlay.tick(ms(1));
        assert!(overlay.banner.is_none());
    }
}
