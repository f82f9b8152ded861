//! Orbit camera model using dolly
//!
//! The scene is viewed from a rig orbiting the area center. State is three
//! numbers: horizontal rotation, vertical rotation and zoom level (percent).

use dolly::prelude::*;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::{DEFAULT_LIGHT_POS, Z_COMP};

const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

pub fn wgpu_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    // wgpu uses 0..1 depth; no Y flip needed for NDC orientation.
    OPENGL_TO_WGPU_MATRIX * Mat4::perspective_rh(fov_y, aspect, near, far)
}

pub const MIN_ZOOM: f32 = 10.0;
pub const MAX_ZOOM: f32 = 500.0;
pub const DEFAULT_ZOOM: f32 = 100.0;
pub const MIN_VERTICAL: f32 = 0.0;
pub const MAX_VERTICAL: f32 = 90.0;
pub const HORIZONTAL_LIMIT: f32 = 180.0;

/// Vertical field of view of the scene projection, degrees
pub const FOV: f32 = 45.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;

/// Eye distance from the area center at zoom 100
const BASE_DISTANCE: f32 = 1.0 + 2.9 * Z_COMP - Z_COMP;

/// Named viewing angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPreset {
    FrontLow,
    Front,
    FrontHigh,
    LeftHigh,
    RightHigh,
    BehindHigh,
    IsometricLeft,
    IsometricLeftHigh,
    IsometricRight,
    IsometricRightHigh,
    DirectlyAbove,
}

impl CameraPreset {
    pub const ALL: [CameraPreset; 11] = [
        Self::FrontLow,
        Self::Front,
        Self::FrontHigh,
        Self::LeftHigh,
        Self::RightHigh,
        Self::BehindHigh,
        Self::IsometricLeft,
        Self::IsometricLeftHigh,
        Self::IsometricRight,
        Self::IsometricRightHigh,
        Self::DirectlyAbove,
    ];

    /// (horizontal, vertical) in degrees
    pub fn angles(self) -> (f32, f32) {
        match self {
            Self::FrontLow => (0.0, 0.0),
            Self::Front => (0.0, 15.0),
            Self::FrontHigh => (0.0, 45.0),
            Self::LeftHigh => (90.0, 45.0),
            Self::RightHigh => (-90.0, 45.0),
            Self::BehindHigh => (180.0, 45.0),
            Self::IsometricLeft => (45.0, 22.5),
            Self::IsometricLeftHigh => (45.0, 45.0),
            Self::IsometricRight => (-45.0, 22.5),
            Self::IsometricRightHigh => (-45.0, 45.0),
            Self::DirectlyAbove => (0.0, 90.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FrontLow => "Front low",
            Self::Front => "Front",
            Self::FrontHigh => "Front high",
            Self::LeftHigh => "Left high",
            Self::RightHigh => "Right high",
            Self::BehindHigh => "Behind high",
            Self::IsometricLeft => "Isometric left",
            Self::IsometricLeftHigh => "Isometric left high",
            Self::IsometricRight => "Isometric right",
            Self::IsometricRightHigh => "Isometric right high",
            Self::DirectlyAbove => "Directly above",
        }
    }
}

/// Wrap an angle into [-180, 180].
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + HORIZONTAL_LIMIT).rem_euclid(2.0 * HORIZONTAL_LIMIT) - HORIZONTAL_LIMIT;
    if wrapped == -HORIZONTAL_LIMIT && angle > 0.0 {
        HORIZONTAL_LIMIT
    } else {
        wrapped
    }
}

/// Orbit camera rig around the area center.
///
/// The arm hangs off the pivot along the rig's local +Z, so the rig
/// rotation alone keeps the eye aimed at the target.
pub struct CameraModel {
    rig: CameraRig,
    horizontal: f32,
    vertical: f32,
    zoom_level: f32,
    target: Vec3,
}

impl CameraModel {
    pub fn new() -> Self {
        let target = Vec3::new(0.0, 0.0, Z_COMP);
        let rig = CameraRig::builder()
            .with(Position::new(mint::Point3 { x: target.x, y: target.y, z: target.z }))
            .with(YawPitch::new())
            .with(Arm::new(mint::Vector3 { x: 0.0, y: 0.0, z: BASE_DISTANCE }))
            .build();

        let mut camera = Self {
            rig,
            horizontal: 0.0,
            vertical: 45.0,
            zoom_level: DEFAULT_ZOOM,
            target,
        };
        camera.apply_rotation();
        camera
    }

    fn apply_rotation(&mut self) {
        let yp = self.rig.driver_mut::<YawPitch>();
        yp.set_rotation_quat(mint::Quaternion::from(Quat::from_euler(
            glam::EulerRot::YXZ,
            self.horizontal.to_radians(),
            (-self.vertical).to_radians(),
            0.0,
        )));
        // No smoothing drivers, so one update settles the rig
        self.rig.update(1.0);
    }

    /// Set rotation and zoom, clamping each to its range.
    pub fn set_camera_position(&mut self, horizontal: f32, vertical: f32, zoom_level: f32) {
        self.horizontal = horizontal.clamp(-HORIZONTAL_LIMIT, HORIZONTAL_LIMIT);
        self.vertical = vertical.clamp(MIN_VERTICAL, MAX_VERTICAL);
        self.zoom_level = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
        self.apply_rotation();
    }

    /// Rotate by a drag delta; horizontal wraps around, vertical clamps.
    pub fn rotate_by(&mut self, delta_horizontal: f32, delta_vertical: f32) {
        self.horizontal = wrap_degrees(self.horizontal + delta_horizontal);
        self.vertical = (self.vertical + delta_vertical).clamp(MIN_VERTICAL, MAX_VERTICAL);
        self.apply_rotation();
    }

    pub fn set_zoom_level(&mut self, zoom_level: f32) {
        self.zoom_level = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    /// (horizontal, vertical) rotation in degrees
    pub fn rotation(&self) -> (f32, f32) {
        (self.horizontal, self.vertical)
    }

    /// Back to the default angles, keeping the zoom level.
    pub fn reset_rotation(&mut self) {
        self.horizontal = 0.0;
        self.vertical = 45.0;
        self.apply_rotation();
    }

    pub fn apply_preset(&mut self, preset: CameraPreset) {
        let (h, v) = preset.angles();
        self.set_camera_position(h, v, self.zoom_level);
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Eye position at zoom 100.
    pub fn position(&self) -> Vec3 {
        let p = self.rig.final_transform.position;
        Vec3::new(p.x, p.y, p.z)
    }

    fn orientation(&self) -> Quat {
        let rot = self.rig.final_transform.rotation;
        Quat::from_xyzw(rot.v.x, rot.v.y, rot.v.z, rot.s)
    }

    /// Eye position for the current zoom, scaled by `auto_scale`.
    pub fn eye(&self, auto_scale: f32) -> Vec3 {
        let effective_zoom = (self.zoom_level * auto_scale).max(f32::EPSILON);
        self.target + (self.position() - self.target) * (DEFAULT_ZOOM / effective_zoom)
    }

    /// View matrix; `auto_scale` shrinks the scene for narrow viewports.
    pub fn view_matrix(&self, auto_scale: f32) -> Mat4 {
        let up: Vec3 = self.rig.final_transform.up();
        Mat4::look_at_rh(self.eye(auto_scale), self.target, up)
    }

    /// Scene projection in wgpu clip space.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        wgpu_projection(FOV.to_radians(), aspect, NEAR, FAR)
    }

    /// Light above the eye, rotating with the camera, pushed back by
    /// `distance_mod`.
    pub fn light_position(&self, distance_mod: f32) -> Vec3 {
        let offset = Vec3::new(
            DEFAULT_LIGHT_POS.x,
            DEFAULT_LIGHT_POS.y,
            DEFAULT_LIGHT_POS.z + BASE_DISTANCE + distance_mod,
        );
        self.target + self.orientation() * offset
    }
}

impl Default for CameraModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_camera_position_clamps() {
        let mut camera = CameraModel::new();
        camera.set_camera_position(270.0, 120.0, 900.0);
        assert_eq!(camera.rotation(), (180.0, 90.0));
        assert_eq!(camera.zoom_level(), MAX_ZOOM);

        camera.set_camera_position(-400.0, -5.0, 1.0);
        assert_eq!(camera.rotation(), (-180.0, 0.0));
        assert_eq!(camera.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn test_rotate_by_wraps_horizontal() {
        let mut camera = CameraModel::new();
        camera.set_camera_position(170.0, 45.0, 100.0);
        camera.rotate_by(20.0, 60.0);
        let (h, v) = camera.rotation();
        assert!((h + 170.0).abs() < 1e-4);
        assert_eq!(v, 90.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), -180.0);
    }

    #[test]
    fn test_eye_distance_follows_zoom() {
        let mut camera = CameraModel::new();
        let d100 = (camera.eye(1.0) - camera.target()).length();
        assert!((d100 - BASE_DISTANCE).abs() < 1e-3);

        camera.set_zoom_level(200.0);
        let d200 = (camera.eye(1.0) - camera.target()).length();
        assert!((d200 - BASE_DISTANCE / 2.0).abs() < 1e-3);

        let narrow = (camera.eye(0.5) - camera.target()).length();
        assert!((narrow - BASE_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn test_default_view_is_above_area() {
        let camera = CameraModel::new();
        assert!(camera.position().y > camera.target().y);
        assert!(camera.light_position(0.0).y > camera.target().y);

        let mut top = CameraModel::new();
        top.apply_preset(CameraPreset::DirectlyAbove);
        // The rig's yaw/pitch round trip is only accurate to a few hundredths of a degree
        let up_angle = (top.position() - top.target()).angle_between(Vec3::Y).to_degrees();
        assert!(up_angle < 0.1, "eye is {up_angle} degrees off vertical");
    }
}
