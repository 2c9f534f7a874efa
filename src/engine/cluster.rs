//! Same-color cluster detection over the settled board.

use crate::engine::physics::{BodyHandle, Vec2};
use crate::engine::piece::Footprint;
use std::collections::{BTreeMap, VecDeque};

/// Distance predicate deciding whether two pieces count as touching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Connectivity {
    /// Center distance minus both half-sizes is below `threshold`.
    Gap { threshold: f64 },
    /// Center distance is below the mean of both max extents plus `margin`.
    Bounds { margin: f64 },
}

impl Connectivity {
    pub const DEFAULT_GAP: Self = Self::Gap { threshold: 50.0 };
    pub const DEFAULT_BOUNDS: Self = Self::Bounds { margin: 5.0 };

    pub fn connects(&self, a: &Footprint, b: &Footprint) -> bool {
        let distance = a.center.distance(b.center);
        match *self {
            Self::Gap { threshold } => distance - a.half_size() - b.half_size() < threshold,
            Self::Bounds { margin } => {
                distance < (a.bounds.max_extent() + b.bounds.max_extent()) / 2.0 + margin
            }
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::DEFAULT_GAP
    }
}

/// One connected same-color component.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub color: u8,
    pub members: Vec<BodyHandle>,
    pub centroid: Vec2,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.members.contains(&handle)
    }
}

/// Partition footprints into maximal same-color components (BFS per color).
/// Colors are visited in ascending order; members keep input order of discovery.
pub fn components(footprints: &[Footprint], policy: Connectivity) -> Vec<Cluster> {
    let mut by_color: BTreeMap<u8, Vec<&Footprint>> = BTreeMap::new();
    for fp in footprints {
        by_color.entry(fp.color).or_default().push(fp);
    }

    let mut out = Vec::new();
    for (color, group) in by_color {
        let mut visited = vec![false; group.len()];
        for start in 0..group.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut queue = VecDeque::from([start]);
            let mut members = Vec::new();
            while let Some(i) = queue.pop_front() {
                members.push(i);
                for j in 0..group.len() {
                    if !visited[j] && policy.connects(group[i], group[j]) {
                        visited[j] = true;
                        queue.push_back(j);
                    }
                }
            }
            let centroid = Vec2::centroid(members.iter().map(|&i| group[i].center))
                .unwrap_or(Vec2::ZERO);
            out.push(Cluster {
                color,
                members: members.iter().map(|&i| group[i].handle).collect(),
                centroid,
            });
        }
    }
    out
}

/// Components with at least `min_size` members, skipping any that hold `falling`.
pub fn clearable(
    footprints: &[Footprint],
    policy: Connectivity,
    min_size: usize,
    falling: Option<BodyHandle>,
) -> Vec<Cluster> {
    components(footprints, policy)
        .into_iter()
        .filter(|c| c.len() >= min_size)
        .filter(|c| falling.is_none_or(|h| !c.contains(h)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::Aabb;

    fn circle(id: u64, color: u8, x: f64, y: f64) -> Footprint {
        let center = Vec2::new(x, y);
        Footprint {
            handle: BodyHandle(id),
            color,
            center,
            bounds: Aabb::around(center, 30.0, 30.0),
            radius: Some(30.0),
        }
    }

    fn boxed(id: u64, color: u8, x: f64, y: f64, hw: f64, hh: f64) -> Footprint {
        let center = Vec2::new(x, y);
        Footprint {
            handle: BodyHandle(id),
            color,
            center,
            bounds: Aabb::around(center, hw, hh),
            radius: None,
        }
    }

    #[test]
    fn test_chain_forms_one_component() {
        // Neighbours 100 apart: gap 40 < 50. Ends are far apart but linked through the chain.
        let fps: Vec<_> = (0..6).map(|i| circle(i, 1, i as f64 * 100.0, 500.0)).collect();
        let comps = components(&fps, Connectivity::DEFAULT_GAP);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 6);
    }

    #[test]
    fn test_colors_never_merge() {
        let fps = vec![
            circle(1, 0, 0.0, 0.0),
            circle(2, 1, 1.0, 0.0),
            circle(3, 0, 2.0, 0.0),
            circle(4, 1, 3.0, 0.0),
        ];
        let comps = components(&fps, Connectivity::DEFAULT_GAP);
        assert_eq!(comps.len(), 2);
        for c in &comps {
            assert_eq!(c.len(), 2);
            for h in &c.members {
                let fp = fps.iter().find(|f| f.handle == *h).unwrap();
                assert_eq!(fp.color, c.color);
            }
        }
    }

    #[test]
    fn test_gap_policy_threshold() {
        let a = circle(1, 0, 0.0, 0.0);
        let near = circle(2, 0, 109.0, 0.0);
        let far = circle(3, 0, 111.0, 0.0);
        assert!(Connectivity::DEFAULT_GAP.connects(&a, &near));
        assert!(!Connectivity::DEFAULT_GAP.connects(&a, &far));
    }

    #[test]
    fn test_gap_policy_uses_larger_half_extent() {
        let a = boxed(1, 0, 0.0, 0.0, 60.0, 15.0);
        let b = boxed(2, 0, 150.0, 0.0, 30.0, 30.0);
        // 150 - 60 - 30 = 60, not connected; move closer to 135 -> 45.
        assert!(!Connectivity::DEFAULT_GAP.connects(&a, &b));
        let b = boxed(2, 0, 135.0, 0.0, 30.0, 30.0);
        assert!(Connectivity::DEFAULT_GAP.connects(&a, &b));
    }

    #[test]
    fn test_bounds_policy_margin() {
        let a = boxed(1, 0, 0.0, 0.0, 30.0, 30.0);
        let touching = boxed(2, 0, 64.0, 0.0, 30.0, 30.0);
        let apart = boxed(3, 0, 66.0, 0.0, 30.0, 30.0);
        assert!(Connectivity::DEFAULT_BOUNDS.connects(&a, &touching));
        assert!(!Connectivity::DEFAULT_BOUNDS.connects(&a, &apart));
    }

    #[test]
    fn test_clearable_needs_five() {
        let mut fps: Vec<_> = (0..4).map(|i| circle(i, 2, i as f64 * 60.0, 0.0)).collect();
        assert!(clearable(&fps, Connectivity::DEFAULT_GAP, 5, None).is_empty());
        fps.push(circle(4, 2, 240.0, 0.0));
        let found = clearable(&fps, Connectivity::DEFAULT_GAP, 5, None);
        assert_eq!(found.len(), 1);
        assert!((found[0].centroid.x - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_clearable_skips_cluster_with_falling_piece() {
        let fps: Vec<_> = (0..5).map(|i| circle(i, 2, i as f64 * 60.0, 0.0)).collect();
        assert!(clearable(&fps, Connectivity::DEFAULT_GAP, 5, Some(BodyHandle(3))).is_empty());
        assert_eq!(clearable(&fps, Connectivity::DEFAULT_GAP, 5, Some(BodyHandle(99))).len(), 1);
    }
}
