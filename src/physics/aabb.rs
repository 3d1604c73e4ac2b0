use crate::math::Vec3;

/// Axis-aligned bounding box over a world-space point set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    /// Half extents, handy for debug volumes
    pub scale: Vec3,
}

impl Aabb {
    /// Bounding volume of a point cloud. An empty cloud yields the empty box.
    pub fn from_points(points: &[Vec3]) -> Aabb {
        let Some(p0) = points.first() else {
            return Aabb::default();
        };

        let (mut min, mut max) = (*p0, *p0);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        let (width, height, depth) = (max.x - min.x, max.y - min.y, max.z - min.z);
        Aabb {
            min,
            max,
            width,
            height,
            depth,
            scale: Vec3::new(width / 2.0, height / 2.0, depth / 2.0),
        }
    }

    /// A box with zero volume never produces candidate pairs
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0 && self.depth == 0.0
    }

    /// Strict overlap on all three axes
    pub fn intersects(&self, o: &Aabb) -> bool {
        self.max.x > o.min.x
            && self.min.x < o.max.x
            && self.max.y > o.min.y
            && self.min.y < o.max.y
            && self.max.z > o.min.z
            && self.min.z < o.max.z
    }
}
