//! Collision shapes and exact intersection tests
//!
//! Ships are oriented rectangles centred on their position, cannon balls are
//! circles. Every test runs an axis-aligned bounding box check first and only
//! then the exact narrow-phase test for the shape pair.

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Rectangle rotated about its centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedRect {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
    /// Rotation in radians
    pub angle: f32,
}

impl OrientedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, angle: f32) -> Self {
        Self {
            x,
            y,
            half_width: width / 2.0,
            half_height: height / 2.0,
            angle,
        }
    }

    /// Unit vectors of the local x and y axes in world space
    fn axes(&self) -> [(f32, f32); 2] {
        let (sin, cos) = self.angle.sin_cos();
        [(cos, sin), (-sin, cos)]
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        let [(ux, uy), (vx, vy)] = self.axes();
        let (hw, hh) = (self.half_width, self.half_height);
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(a, b)| (self.x + ux * a + vx * b, self.y + uy * a + vy * b))
    }

    pub fn aabb(&self) -> Aabb {
        let (sin, cos) = self.angle.sin_cos();
        let extent_x = self.half_width * cos.abs() + self.half_height * sin.abs();
        let extent_y = self.half_width * sin.abs() + self.half_height * cos.abs();
        Aabb {
            min_x: self.x - extent_x,
            min_y: self.y - extent_y,
            max_x: self.x + extent_x,
            max_y: self.y + extent_y,
        }
    }

    /// Project onto `axis`, returning (min, max)
    fn project(&self, axis: (f32, f32)) -> (f32, f32) {
        self.corners()
            .iter()
            .map(|&(x, y)| x * axis.0 + y * axis.1)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            min_x: self.x - self.radius,
            min_y: self.y - self.radius,
            max_x: self.x + self.radius,
            max_y: self.y + self.radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect(OrientedRect),
    Circle(Circle),
}

impl Shape {
    pub fn aabb(&self) -> Aabb {
        match self {
            Shape::Rect(r) => r.aabb(),
            Shape::Circle(c) => c.aabb(),
        }
    }
}

impl From<OrientedRect> for Shape {
    fn from(rect: OrientedRect) -> Self {
        Shape::Rect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

/// Exact overlap test. Touching shapes intersect.
pub fn intersects(a: &Shape, b: &Shape) -> bool {
    if !a.aabb().overlaps(&b.aabb()) {
        return false;
    }

    match (a, b) {
        (Shape::Circle(a), Shape::Circle(b)) => circles_intersect(a, b),
        (Shape::Rect(r), Shape::Circle(c)) | (Shape::Circle(c), Shape::Rect(r)) => {
            rect_circle_intersect(r, c)
        }
        (Shape::Rect(a), Shape::Rect(b)) => rects_intersect(a, b),
    }
}

fn circles_intersect(a: &Circle, b: &Circle) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let combined = a.radius + b.radius;
    dx * dx + dy * dy <= combined * combined
}

/// Closest point on the rectangle to the circle centre, computed in the
/// rectangle's local frame
fn rect_circle_intersect(rect: &OrientedRect, circle: &Circle) -> bool {
    let [(ux, uy), (vx, vy)] = rect.axes();
    let dx = circle.x - rect.x;
    let dy = circle.y - rect.y;

    let local_x = dx * ux + dy * uy;
    let local_y = dx * vx + dy * vy;

    let nearest_x = local_x.clamp(-rect.half_width, rect.half_width);
    let nearest_y = local_y.clamp(-rect.half_height, rect.half_height);

    let ox = local_x - nearest_x;
    let oy = local_y - nearest_y;
    ox * ox + oy * oy <= circle.radius * circle.radius
}

/// Separating-axis test over the edge normals of both rectangles
fn rects_intersect(a: &OrientedRect, b: &OrientedRect) -> bool {
    a.axes().into_iter().chain(b.axes()).all(|axis| {
        let (a_min, a_max) = a.project(axis);
        let (b_min, b_max) = b.project(axis);
        a_min <= b_max && b_min <= a_max
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn hull(x: f32, y: f32, angle: f32) -> Shape {
        OrientedRect::new(x, y, 113.0, 66.0, angle).into()
    }

    fn ball(x: f32, y: f32) -> Shape {
        Circle::new(x, y, 5.0).into()
    }

    #[test]
    fn circle_inside_hull_hits() {
        assert!(intersects(&hull(100.0, 100.0, 0.0), &ball(100.0, 100.0)));
    }

    #[test]
    fn circle_grazing_long_side_hits() {
        // Hull spans y in [67, 133]; ball edge reaches 133 exactly
        assert!(intersects(&hull(100.0, 100.0, 0.0), &ball(100.0, 138.0)));
        assert!(!intersects(&hull(100.0, 100.0, 0.0), &ball(100.0, 138.5)));
    }

    #[test]
    fn rotation_changes_outcome() {
        // 50 units ahead along x: inside an unrotated hull (half width 56.5),
        // outside once the hull is turned 90 degrees (half height 33)
        let target = ball(150.0, 100.0);
        assert!(intersects(&hull(100.0, 100.0, 0.0), &target));
        assert!(!intersects(
            &hull(100.0, 100.0, std::f32::consts::FRAC_PI_2),
            &target
        ));
    }

    #[test]
    fn corner_region_needs_exact_test() {
        // Inside the AABB of a 45 degree hull but beyond its corner
        let rect = hull(0.0, 0.0, FRAC_PI_4);
        let aabb = rect.aabb();
        let probe = ball(aabb.max_x - 2.0, aabb.max_y - 2.0);
        assert!(rect.aabb().overlaps(&probe.aabb()));
        assert!(!intersects(&rect, &probe));
    }

    #[test]
    fn circles() {
        assert!(intersects(&ball(0.0, 0.0), &ball(10.0, 0.0)));
        assert!(!intersects(&ball(0.0, 0.0), &ball(10.1, 0.0)));
    }

    #[test]
    fn rect_pairs_use_separating_axes() {
        assert!(intersects(&hull(0.0, 0.0, 0.0), &hull(110.0, 0.0, 0.0)));
        assert!(!intersects(&hull(0.0, 0.0, 0.0), &hull(120.0, 0.0, 0.0)));
        // AABBs overlap, but a 45 degree hull's corner stops short
        let a = hull(0.0, 0.0, 0.0);
        let b = hull(100.0, 75.0, FRAC_PI_4);
        assert!(a.aabb().overlaps(&b.aabb()));
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn symmetric_for_mixed_pairs() {
        let r = hull(50.0, 50.0, 1.0);
        let c = ball(90.0, 80.0);
        assert_eq!(intersects(&r, &c), intersects(&c, &r));
    }
}
