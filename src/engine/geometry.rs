//! Shape kinds and area-preserving geometry.
//!
//! Every piece encloses the same target area regardless of its kind, so a circle and a
//! rhombus of the same size category weigh the same on the board.

use crate::engine::physics::Vec2;
use std::f64::consts::PI;

/// Points sampled around an oval.
const OVAL_SAMPLES: usize = 20;
/// Oval width/height ratio.
const OVAL_ASPECT: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle,
    Square,
    Rectangle,
    Triangle,
    Pentagon,
    Hexagon,
    Trapezoid,
    Rhombus,
    Oval,
}

impl ShapeKind {
    pub const ALL: [Self; 9] = [
        Self::Circle,
        Self::Square,
        Self::Rectangle,
        Self::Triangle,
        Self::Pentagon,
        Self::Hexagon,
        Self::Trapezoid,
        Self::Rhombus,
        Self::Oval,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Triangle => "triangle",
            Self::Pentagon => "pentagon",
            Self::Hexagon => "hexagon",
            Self::Trapezoid => "trapezoid",
            Self::Rhombus => "rhombus",
            Self::Oval => "oval",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Size parameters of one piece, in local coordinates centred on the piece.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Circle { radius: f64 },
    Rect { width: f64, height: f64 },
    /// Regular polygon given by its circumradius.
    Regular { sides: u8, radius: f64 },
    /// Arbitrary convex outline, counter-clockwise, centred on its centroid.
    Outline { vertices: Vec<Vec2> },
}

impl Geometry {
    /// Geometry of `kind` enclosing `area` square units.
    pub fn for_area(kind: ShapeKind, area: f64) -> Self {
        debug_assert!(area > 0.0, "target area must be positive");
        match kind {
            ShapeKind::Circle => Self::Circle {
                radius: (area / PI).sqrt(),
            },
            ShapeKind::Square => {
                let side = area.sqrt();
                Self::Rect {
                    width: side,
                    height: side,
                }
            }
            ShapeKind::Rectangle => {
                let width = area.sqrt() * 2.0;
                Self::Rect {
                    width,
                    height: area / width,
                }
            }
            ShapeKind::Triangle => {
                let side = (4.0 * area / 3f64.sqrt()).sqrt();
                Self::Regular {
                    sides: 3,
                    radius: side / (2.0 * (PI / 3.0).sin()),
                }
            }
            ShapeKind::Pentagon => {
                let side = (4.0 * area * (PI / 5.0).tan() / 5.0).sqrt();
                Self::Regular {
                    sides: 5,
                    radius: side / (2.0 * (PI / 5.0).sin()),
                }
            }
            ShapeKind::Hexagon => {
                // A regular hexagon's side equals its circumradius.
                let side = (2.0 * area / (3.0 * 3f64.sqrt())).sqrt();
                Self::Regular {
                    sides: 6,
                    radius: side,
                }
            }
            ShapeKind::Trapezoid => {
                let top = (area * 1.2).sqrt();
                let bottom = top * 2.0 / 3.0;
                let height = 2.0 * area / (top + bottom);
                let vertices = vec![
                    Vec2::new(-top / 2.0, -height / 2.0),
                    Vec2::new(-bottom / 2.0, height / 2.0),
                    Vec2::new(bottom / 2.0, height / 2.0),
                    Vec2::new(top / 2.0, -height / 2.0),
                ];
                Self::Outline {
                    vertices: recentred(vertices),
                }
            }
            ShapeKind::Rhombus => {
                let width = (area * 3.0).sqrt();
                let height = 2.0 * area / width;
                Self::Outline {
                    vertices: vec![
                        Vec2::new(0.0, -height / 2.0),
                        Vec2::new(-width / 2.0, 0.0),
                        Vec2::new(0.0, height / 2.0),
                        Vec2::new(width / 2.0, 0.0),
                    ],
                }
            }
            ShapeKind::Oval => {
                // Scale the semi-axes so the sampled polygon, not the true ellipse, has `area`.
                let n = OVAL_SAMPLES as f64;
                let ab = 2.0 * area / (n * (2.0 * PI / n).sin());
                let b = (ab / OVAL_ASPECT).sqrt();
                let a = b * OVAL_ASPECT;
                let vertices = (0..OVAL_SAMPLES)
                    .map(|i| {
                        let t = 2.0 * PI * i as f64 / n;
                        Vec2::new(a * t.cos(), -b * t.sin())
                    })
                    .collect();
                Self::Outline { vertices }
            }
        }
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        match self {
            Self::Circle { radius } => PI * radius * radius,
            Self::Rect { width, height } => width * height,
            Self::Regular { sides, radius } => {
                let n = f64::from(*sides);
                0.5 * n * radius * radius * (2.0 * PI / n).sin()
            }
            Self::Outline { vertices } => shoelace(vertices).abs(),
        }
    }

    /// Local outline; circles are sampled with `circle_samples` points.
    pub fn outline(&self, circle_samples: usize) -> Vec<Vec2> {
        match self {
            Self::Circle { radius } => regular_vertices(circle_samples.max(3), *radius),
            Self::Rect { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(-hw, hh),
                    Vec2::new(hw, hh),
                    Vec2::new(hw, -hh),
                ]
            }
            Self::Regular { sides, radius } => regular_vertices(usize::from(*sides), *radius),
            Self::Outline { vertices } => vertices.clone(),
        }
    }

    /// Half width and half height of the unrotated shape.
    pub fn half_extents(&self) -> Vec2 {
        match self {
            Self::Circle { radius } => Vec2::new(*radius, *radius),
            Self::Rect { width, height } => Vec2::new(width / 2.0, height / 2.0),
            _ => self.outline(0).iter().fold(Vec2::ZERO, |acc, v| {
                Vec2::new(acc.x.max(v.x.abs()), acc.y.max(v.y.abs()))
            }),
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            Self::Circle { radius } => Some(*radius),
            _ => None,
        }
    }
}

/// Vertices of a regular polygon with one vertex pointing up.
fn regular_vertices(sides: usize, radius: f64) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let t = -PI / 2.0 - 2.0 * PI * i as f64 / sides as f64;
            Vec2::new(radius * t.cos(), radius * t.sin())
        })
        .collect()
}

/// Signed shoelace area.
pub fn shoelace(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Shift a polygon so its area centroid sits at the origin.
fn recentred(vertices: Vec<Vec2>) -> Vec<Vec2> {
    let signed = shoelace(&vertices);
    if signed == 0.0 {
        return vertices;
    }
    let n = vertices.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    let c = Vec2::new(cx / (6.0 * signed), cy / (6.0 * signed));
    vertices
        .into_iter()
        .map(|v| Vec2::new(v.x - c.x, v.y - c.y))
        .collect()
}
