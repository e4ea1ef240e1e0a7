//! Camera component

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::registry::{Component, ComponentKind, SlotPool};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection with an infinite far plane
    Perspective { fov_y: f32, aspect: f32, near: f32 },
    Orthographic {
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect: 1.0,
            near: 0.05,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near } => {
                Mat4::perspective_infinite_rh(fov_y, aspect, near)
            }
            Projection::Orthographic {
                width,
                height,
                near,
                far,
            } => {
                let (half_w, half_h) = (width / 2.0, height / 2.0);
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }

    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. } => *near,
            Projection::Orthographic { near, .. } => *near,
        }
    }
}

/// Camera lens and projection state.
///
/// Placement comes from the Transform bound on the same entity.
#[derive(Debug, Clone)]
pub struct Camera {
    projection: Projection,
    view: Mat4,
    focal_distance: f32,
    aperture_diameter: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            view: Mat4::IDENTITY,
            focal_distance: 1.0,
            aperture_diameter: 0.0,
        }
    }
}

impl Camera {
    /// Perspective camera from a vertical field of view in radians
    pub fn perspective_from_fov(fov_y: f32, aspect: f32, near: f32) -> Self {
        Self {
            projection: Projection::Perspective { fov_y, aspect, near },
            ..Default::default()
        }
    }

    /// Perspective camera from a lens focal length and sensor size, all in mm
    pub fn perspective_from_focal_length(
        focal_length: f32,
        sensor_width: f32,
        sensor_height: f32,
        near: f32,
    ) -> Self {
        let fov_y = 2.0 * (sensor_height / (2.0 * focal_length)).atan();
        Self::perspective_from_fov(fov_y, sensor_width / sensor_height, near)
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic {
                width,
                height,
                near,
                far,
            },
            ..Default::default()
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn focal_distance(&self) -> f32 {
        self.focal_distance
    }

    /// Distance to the plane in perfect focus
    pub fn set_focal_distance(&mut self, distance: f32) {
        self.focal_distance = distance;
    }

    pub fn aperture_diameter(&self) -> f32 {
        self.aperture_diameter
    }

    /// Lens aperture; zero gives a pinhole camera
    pub fn set_aperture_diameter(&mut self, diameter: f32) {
        self.aperture_diameter = diameter.max(0.0);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = width / height;
        }
    }
}

impl Component for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;
    type Gpu = CameraStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> CameraStruct {
        let proj = self.projection.matrix();
        CameraStruct {
            proj,
            view: self.view,
            inv_proj: proj.inverse(),
            inv_view: self.view.inverse(),
            lens: Vec4::new(
                self.focal_distance,
                self.aperture_diameter,
                self.projection.near(),
                0.0,
            ),
        }
    }
}

/// Camera data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraStruct {
    pub proj: Mat4,
    pub view: Mat4,
    pub inv_proj: Mat4,
    pub inv_view: Mat4,
    pub lens: Vec4, // x=focal distance, y=aperture diameter, z=near
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_length_matches_equivalent_fov() {
        // 36x24mm sensor with a 12mm lens: vertical fov = 2*atan(1) = 90 degrees.
        let camera = Camera::perspective_from_focal_length(12.0, 36.0, 24.0, 0.1);
        let Projection::Perspective { fov_y, aspect, near } = camera.projection() else {
            panic!("expected perspective projection");
        };
        assert!((fov_y - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((aspect - 1.5).abs() < 1e-6);
        assert_eq!(near, 0.1);
    }

    #[test]
    fn negative_aperture_clamps_to_pinhole() {
        let mut camera = Camera::default();
        camera.set_aperture_diameter(-1.0);
        assert_eq!(camera.aperture_diameter(), 0.0);
    }

    #[test]
    fn gpu_struct_carries_lens_parameters() {
        let pool = SlotPool::<Camera>::allocate(1);
        let mut camera = Camera::perspective_from_fov(1.0, 2.0, 0.25);
        camera.set_focal_distance(3.0);
        camera.set_aperture_diameter(0.5);
        let gpu = camera.to_gpu(&pool);
        assert_eq!(gpu.lens, Vec4::new(3.0, 0.5, 0.25, 0.0));
        assert!((gpu.proj * gpu.inv_proj).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }
}
