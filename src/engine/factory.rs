//! Piece generation: random kind and color, equal-area geometry, body creation.

use crate::engine::geometry::{Geometry, ShapeKind};
use crate::engine::physics::{Material, PhysicsError, PhysicsWorld, Vec2};
use crate::engine::piece::{Piece, PieceStatus};
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct PieceFactory {
    target_area: f64,
    material: Material,
}

impl PieceFactory {
    pub fn new(target_area: f64, material: Material) -> Self {
        Self {
            target_area,
            material,
        }
    }

    pub fn target_area(&self) -> f64 {
        self.target_area
    }

    /// Kind uniformly over all kinds, color uniformly over `0..unlocked_colors`.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R, unlocked_colors: usize) -> (ShapeKind, u8) {
        let kind = *ShapeKind::ALL
            .choose(rng)
            .unwrap_or(&ShapeKind::Circle);
        let color = rng.gen_range(0..unlocked_colors.max(1)) as u8;
        (kind, color)
    }

    /// Create a falling piece at `at`.
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        world: &mut dyn PhysicsWorld,
        rng: &mut R,
        unlocked_colors: usize,
        at: Vec2,
    ) -> Result<Piece, PhysicsError> {
        let (kind, color) = self.choose(rng, unlocked_colors);
        let geometry = Geometry::for_area(kind, self.target_area);
        let handle = world.create_body(kind, &geometry, &self.material, at)?;
        Ok(Piece {
            handle,
            kind,
            color,
            geometry,
            status: PieceStatus::Falling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeWorld;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_spawn_creates_falling_body() {
        let mut world = FakeWorld::new();
        let mut rng = StdRng::seed_from_u64(1);
        let factory = PieceFactory::new(3500.0, Material::PIECE);
        let piece = factory
            .spawn(&mut world, &mut rng, 4, Vec2::new(210.0, 50.0))
            .unwrap();
        assert_eq!(piece.status, PieceStatus::Falling);
        assert!(piece.color < 4);
        assert_eq!(world.position(piece.handle), Some(Vec2::new(210.0, 50.0)));
        assert!((piece.geometry.area() - 3500.0).abs() / 3500.0 < 0.01);
    }

    #[test]
    fn test_choices_cover_unlocked_set_only() {
        let mut rng = StdRng::seed_from_u64(42);
        let factory = PieceFactory::new(3500.0, Material::PIECE);
        let mut kinds = HashSet::new();
        let mut colors = HashSet::new();
        for _ in 0..2000 {
            let (k, c) = factory.choose(&mut rng, 3);
            kinds.insert(k);
            colors.insert(c);
        }
        assert_eq!(kinds.len(), ShapeKind::ALL.len());
        assert_eq!(colors, HashSet::from([0, 1, 2]));
    }
}
