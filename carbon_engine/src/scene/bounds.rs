/// Bounding volumes carried by scene entities.

use glam::{Mat4, Vec3};

// ===== AABB =====

/// Axis-Aligned Bounding Box in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Component-wise scale of both corners (entity scale applied to base bounds)
    pub fn scaled(&self, scale: Vec3) -> AABB {
        let a = self.min * scale;
        let b = self.max * scale;
        // Negative scale components swap the corners
        AABB { min: a.min(b), max: a.max(b) }
    }

    /// Axis-aligned bounds of this box after `matrix`.
    ///
    /// Each basis column adds its smaller and larger extent per axis, which
    /// is exact for affine matrices.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let origin = matrix.w_axis.truncate();
        let axes = [matrix.x_axis.truncate(), matrix.y_axis.truncate(), matrix.z_axis.truncate()];
        let (min, max) = axes.iter().enumerate().fold((origin, origin), |(min, max), (i, axis)| {
            let lo = *axis * self.min[i];
            let hi = *axis * self.max[i];
            (min + lo.min(hi), max + lo.max(hi))
        });
        AABB { min, max }
    }
}

// ===== SPHERE =====

/// Bounding sphere in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Scale center component-wise and radius by the largest absolute axis scale
    pub fn scaled(&self, scale: Vec3) -> BoundingSphere {
        BoundingSphere {
            center: self.center * scale,
            radius: self.radius * scale.abs().max_element(),
        }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
