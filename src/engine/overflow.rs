//! Crowd control: when the arena is crowded, clear tightly packed pieces near the floor
//! regardless of color.

use crate::engine::physics::{BodyHandle, Vec2};
use crate::engine::piece::Footprint;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverflowMonitor {
    /// Fill ratio at which the monitor starts acting.
    pub trigger_ratio: f64,
    /// Fill ratio at which the adaptive distance reaches its maximum.
    pub saturation_ratio: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Share of settled pieces, counted from the floor, that are candidates.
    pub bottom_share: f64,
    pub min_candidates: usize,
}

impl Default for OverflowMonitor {
    fn default() -> Self {
        Self {
            trigger_ratio: 0.5,
            saturation_ratio: 0.9,
            min_distance: 50.0,
            max_distance: 250.0,
            bottom_share: 0.4,
            min_candidates: 3,
        }
    }
}

/// Result of one monitor pass that removes something.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub fill_ratio: f64,
    pub distance: f64,
    pub doomed: Vec<BodyHandle>,
    pub centroid: Vec2,
}

impl OverflowMonitor {
    /// Settled bounding-box area over arena area.
    pub fn fill_ratio(footprints: &[Footprint], arena_area: f64) -> f64 {
        if arena_area <= 0.0 {
            return 0.0;
        }
        footprints.iter().map(|f| f.bounds.area()).sum::<f64>() / arena_area
    }

    /// Neighbour distance, linear from `min_distance` at the trigger ratio to
    /// `max_distance` at saturation.
    pub fn adaptive_distance(&self, fill_ratio: f64) -> f64 {
        let span = self.saturation_ratio - self.trigger_ratio;
        let t = ((fill_ratio - self.trigger_ratio) / span).clamp(0.0, 1.0);
        self.min_distance + (self.max_distance - self.min_distance) * t
    }

    /// Pieces to remove this tick, if any.
    ///
    /// A candidate is doomed when at least one other candidate lies within the adaptive
    /// distance; there is no transitive grouping.
    pub fn scan(&self, footprints: &[Footprint], arena_area: f64) -> Option<Sweep> {
        let fill_ratio = Self::fill_ratio(footprints, arena_area);
        if fill_ratio < self.trigger_ratio {
            return None;
        }

        let mut by_depth: Vec<&Footprint> = footprints.iter().collect();
        by_depth.sort_by(|a, b| b.center.y.total_cmp(&a.center.y));
        let take = (footprints.len() as f64 * self.bottom_share).floor() as usize;
        if take < self.min_candidates {
            return None;
        }
        let candidates = &by_depth[..take];

        let distance = self.adaptive_distance(fill_ratio);
        let mut marked = BTreeSet::new();
        for i in 0..candidates.len() {
            for j in i + 1..candidates.len() {
                if candidates[i].center.distance(candidates[j].center) <= distance {
                    marked.insert(i);
                    marked.insert(j);
                }
            }
        }
        if marked.is_empty() {
            return None;
        }

        let centroid = Vec2::centroid(marked.iter().map(|&i| candidates[i].center))?;
        Some(Sweep {
            fill_ratio,
            distance,
            doomed: marked.iter().map(|&i| candidates[i].handle).collect(),
            centroid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::Aabb;

    const ARENA: f64 = 1000.0 * 1000.0;

    /// Square footprint with the given side; area adds to the fill ratio.
    fn square(id: u64, x: f64, y: f64, side: f64) -> Footprint {
        let center = Vec2::new(x, y);
        Footprint {
            handle: BodyHandle(id),
            color: (id % 3) as u8,
            center,
            bounds: Aabb::around(center, side / 2.0, side / 2.0),
            radius: None,
        }
    }

    #[test]
    fn test_adaptive_distance_endpoints() {
        let m = OverflowMonitor::default();
        assert!((m.adaptive_distance(0.5) - 50.0).abs() < 1e-9);
        assert!((m.adaptive_distance(0.6) - 100.0).abs() < 1e-9);
        assert!((m.adaptive_distance(0.9) - 250.0).abs() < 1e-9);
        assert!((m.adaptive_distance(1.4) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_below_half_full() {
        // Ten pieces stacked on one spot but only 40% fill.
        let fps: Vec<_> = (0..10).map(|i| square(i, 500.0, 900.0, 200.0)).collect();
        let fill = OverflowMonitor::fill_ratio(&fps, ARENA);
        assert!((fill - 0.4).abs() < 1e-9);
        assert!(OverflowMonitor::default().scan(&fps, ARENA).is_none());
    }

    #[test]
    fn test_bottom_share_pairs_are_removed() {
        // 10 pieces, 0.6 fill -> distance 100, bottom 4 candidates.
        let side = (ARENA * 0.06).sqrt();
        let mut fps = vec![
            square(0, 100.0, 950.0, side),
            square(1, 180.0, 950.0, side),
            square(2, 700.0, 940.0, side),
            square(3, 790.0, 930.0, side),
        ];
        for i in 4..10 {
            fps.push(square(i, 100.0 * i as f64 - 300.0, 300.0, side));
        }
        let sweep = OverflowMonitor::default().scan(&fps, ARENA).unwrap();
        assert!((sweep.fill_ratio - 0.6).abs() < 1e-9);
        assert!((sweep.distance - 100.0).abs() < 1e-9);
        let mut doomed = sweep.doomed.clone();
        doomed.sort();
        assert_eq!(doomed, vec![BodyHandle(0), BodyHandle(1), BodyHandle(2), BodyHandle(3)]);
    }

    #[test]
    fn test_isolated_candidate_survives() {
        let side = (ARENA * 0.06).sqrt();
        let mut fps = vec![
            square(0, 100.0, 950.0, side),
            square(1, 150.0, 950.0, side),
            square(2, 900.0, 945.0, side),
            square(3, 450.0, 940.0, side),
        ];
        for i in 4..10 {
            fps.push(square(i, 500.0, 100.0, side));
        }
        let sweep = OverflowMonitor::default().scan(&fps, ARENA).unwrap();
        let mut doomed = sweep.doomed.clone();
        doomed.sort();
        assert_eq!(doomed, vec![BodyHandle(0), BodyHandle(1)]);
        assert!((sweep.centroid.x - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_needs_three_candidates() {
        // 7 pieces -> floor(2.8) = 2 candidates.
        let fps: Vec<_> = (0..7).map(|i| square(i, 500.0, 900.0, 300.0)).collect();
        assert!(OverflowMonitor::fill_ratio(&fps, ARENA) > 0.5);
        assert!(OverflowMonitor::default().scan(&fps, ARENA).is_none());
    }
}
