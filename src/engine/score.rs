//! Score accrual, displayed-score easing and the color-unlock ladder.

use rand::Rng;

/// Easing factor applied to the displayed score each presentation tick.
const EASE_FACTOR: f64 = 0.1;
/// First unlock threshold and first gap; each later gap grows by `LADDER_GAP_STEP`.
const LADDER_FIRST: u32 = 300;
const LADDER_GAP_STEP: u32 = 100;
/// Points per removed piece at full occupancy for overflow clears.
const OVERFLOW_POINTS_PER_PIECE: f64 = 20.0;
/// Points per member for size-scaled cluster clears.
const CLUSTER_POINTS_PER_PIECE: u32 = 10;

/// What earned the points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent {
    Spawn,
    Settle,
    ClusterClear { size: usize },
    OverflowClear { removed: usize, fill_ratio: f64 },
}

/// Cluster-clear bonus policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearBonus {
    /// 75..=125 regardless of size.
    Fixed,
    /// 10 per member plus 75..=125.
    #[default]
    Scaled,
}

/// Raw (unclamped) points for an event.
pub fn bonus_for<R: Rng + ?Sized>(event: ScoreEvent, policy: ClearBonus, rng: &mut R) -> i64 {
    match event {
        ScoreEvent::Spawn | ScoreEvent::Settle => rng.gen_range(3..=7),
        ScoreEvent::ClusterClear { size } => {
            let base = rng.gen_range(75..=125);
            match policy {
                ClearBonus::Fixed => base,
                ClearBonus::Scaled => base + i64::from(CLUSTER_POINTS_PER_PIECE) * size as i64,
            }
        }
        ScoreEvent::OverflowClear {
            removed,
            fill_ratio,
        } => (OVERFLOW_POINTS_PER_PIECE * removed as f64 * fill_ratio).round() as i64,
    }
}

/// Next displayed value; snaps to `target` once the gap is below 1.
pub fn ease_step(displayed: f64, target: f64) -> f64 {
    if (target - displayed).abs() < 1.0 {
        target
    } else {
        displayed + (target - displayed) * EASE_FACTOR
    }
}

/// Score at which the `step`-th extra color unlocks (0-based): 300, 600, 1000, 1500, 2100, ...
pub fn unlock_threshold(step: usize) -> u32 {
    let step = step as u32;
    // Sum of gaps 300, 400, 500, ... over `step` entries, on top of the first threshold.
    LADDER_FIRST + step * LADDER_FIRST + LADDER_GAP_STEP * step * step.saturating_sub(1) / 2
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    score: u32,
    displayed: f64,
    unlocked: usize,
    initial_unlocked: usize,
    palette_size: usize,
    max_bonus: u32,
}

impl ScoreTracker {
    pub fn new(initial_unlocked: usize, palette_size: usize, max_bonus: u32) -> Self {
        let initial_unlocked = initial_unlocked.min(palette_size);
        Self {
            score: 0,
            displayed: 0.0,
            unlocked: initial_unlocked,
            initial_unlocked,
            palette_size,
            max_bonus,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn unlocked_colors(&self) -> usize {
        self.unlocked
    }

    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    /// Score needed for the next color, if any remain locked.
    pub fn next_unlock_at(&self) -> Option<u32> {
        (self.unlocked < self.palette_size)
            .then(|| unlock_threshold(self.unlocked - self.initial_unlocked))
    }

    /// Apply a bonus. Non-positive bonuses are dropped and large ones capped.
    /// Returns the points actually added.
    pub fn award(&mut self, points: i64) -> Option<u32> {
        if points <= 0 {
            return None;
        }
        let points = points.min(i64::from(self.max_bonus)) as u32;
        if points == 0 {
            return None;
        }
        self.score = self.score.saturating_add(points);
        self.update_unlocks();
        Some(points)
    }

    /// Advance the displayed score by one presentation tick. Returns true while still easing.
    pub fn tick_display(&mut self) -> bool {
        let target = f64::from(self.score);
        if self.displayed == target {
            return false;
        }
        self.displayed = ease_step(self.displayed, target);
        self.displayed != target
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.displayed = 0.0;
        self.unlocked = self.initial_unlocked;
    }

    fn update_unlocks(&mut self) {
        while self.unlocked < self.palette_size
            && self.score >= unlock_threshold(self.unlocked - self.initial_unlocked)
        {
            self.unlocked += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_ladder_gaps_grow() {
        let t: Vec<u32> = (0..6).map(unlock_threshold).collect();
        assert_eq!(t, vec![300, 600, 1000, 1500, 2100, 2800]);
    }

    #[test]
    fn test_award_clamps_and_drops() {
        let mut s = ScoreTracker::new(4, 10, 1000);
        assert_eq!(s.award(0), None);
        assert_eq!(s.award(-5), None);
        assert_eq!(s.award(5000), Some(1000));
        assert_eq!(s.award(7), Some(7));
        assert_eq!(s.score(), 1007);
    }

    #[test]
    fn test_unlocks_follow_score() {
        let mut s = ScoreTracker::new(4, 10, 1000);
        s.award(299);
        assert_eq!(s.unlocked_colors(), 4);
        s.award(1);
        assert_eq!(s.unlocked_colors(), 5);
        s.award(700);
        // 1000 crosses 600 and 1000.
        assert_eq!(s.unlocked_colors(), 7);
        assert_eq!(s.next_unlock_at(), Some(1500));
    }

    #[test]
    fn test_unlocks_cap_at_palette() {
        let mut s = ScoreTracker::new(8, 10, 1000);
        for _ in 0..20 {
            s.award(1000);
        }
        assert_eq!(s.unlocked_colors(), 10);
        assert_eq!(s.next_unlock_at(), None);
    }

    #[test]
    fn test_reset_restores_initial_palette() {
        let mut s = ScoreTracker::new(3, 10, 1000);
        s.award(1000);
        s.tick_display();
        s.reset();
        assert_eq!(s.score(), 0);
        assert_eq!(s.displayed(), 0.0);
        assert_eq!(s.unlocked_colors(), 3);
    }

    #[test]
    fn test_display_converges_and_stops() {
        let mut s = ScoreTracker::new(4, 10, 1000);
        s.award(250);
        let mut ticks = 0;
        let mut last = s.displayed();
        while s.tick_display() {
            assert!(s.displayed() >= last);
            last = s.displayed();
            ticks += 1;
            assert!(ticks < 200, "easing did not converge");
        }
        assert_eq!(s.displayed(), 250.0);
        assert!(!s.tick_display());
    }

    #[test]
    fn test_ease_step_snaps_inside_one() {
        assert_eq!(ease_step(99.5, 100.0), 100.0);
        assert!((ease_step(0.0, 100.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let settle = bonus_for(ScoreEvent::Settle, ClearBonus::Scaled, &mut rng);
            assert!((3..=7).contains(&settle));
            let fixed = bonus_for(ScoreEvent::ClusterClear { size: 9 }, ClearBonus::Fixed, &mut rng);
            assert!((75..=125).contains(&fixed));
            let scaled =
                bonus_for(ScoreEvent::ClusterClear { size: 9 }, ClearBonus::Scaled, &mut rng);
            assert!((165..=215).contains(&scaled));
        }
        let overflow = bonus_for(
            ScoreEvent::OverflowClear {
                removed: 6,
                fill_ratio: 0.75,
            },
            ClearBonus::Scaled,
            &mut rng,
        );
        assert_eq!(overflow, 90);
    }
}
