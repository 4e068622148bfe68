use serde::{Deserialize, Serialize};

/// Integer circle in pixel coordinates
///
/// Serialized as a `[center_x, center_y, radius]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Circle {
    /// Center column
    pub center_x: i32,
    /// Center row
    pub center_y: i32,
    /// Radius in pixels
    pub radius: i32,
}

impl Circle {
    /// Create a new circle
    pub fn new(center_x: i32, center_y: i32, radius: i32) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }

    /// Center as floating point coordinates
    pub fn center(&self) -> (f64, f64) {
        (self.center_x as f64, self.center_y as f64)
    }

    /// Whether a point lies inside or on the circle
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.contains_with_radius(x, y, self.radius as f64)
    }

    /// Whether a point lies within `radius` of this circle's center
    pub fn contains_with_radius(&self, x: f64, y: f64, radius: f64) -> bool {
        let (cx, cy) = self.center();
        crate::utils::geometry::point_in_circle(cx, cy, radius, x, y)
    }

    /// Shift the center by (dx, dy), keeping the radius
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            center_x: self.center_x + dx,
            center_y: self.center_y + dy,
            radius: self.radius,
        }
    }
}

impl From<[i32; 3]> for Circle {
    fn from([center_x, center_y, radius]: [i32; 3]) -> Self {
        Self::new(center_x, center_y, radius)
    }
}

impl From<Circle> for [i32; 3] {
    fn from(circle: Circle) -> Self {
        [circle.center_x, circle.center_y, circle.radius]
    }
}

impl std::fmt::Display for Circle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, r={})",
            self.center_x, self.center_y, self.radius
        )
    }
}
