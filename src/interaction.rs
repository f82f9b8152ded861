//! Pointer and touch handling.
//!
//! Maps host input to camera changes and tells the pipeline where to pick.
//! Positions are window pixels with the origin at the top-left corner.

use crate::camera::CameraModel;
use crate::util::{Vec2, ViewportRect};

/// Degrees of rotation per dragged pixel.
pub const ROTATION_SPEED: f32 = 0.5;

/// Wheel units per notch.
pub const WHEEL_NOTCH: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerState {
    #[default]
    None,
    /// Picking at the press position
    OnScene,
    /// Pressed on the overview rectangle while zoomed
    OnOverview,
    /// Pressed on the zoomed view
    OnZoom,
    Rotating,
    OnPinch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: PointerState,
    position: Vec2,
    /// Touch hosts swap the meaning of left and right presses
    touch: bool,
    pinch_distance: i32,
}

impl InteractionController {
    pub fn new(touch: bool) -> Self {
        Self {
            touch,
            ..Default::default()
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_touch(&self) -> bool {
        self.touch
    }

    /// Switch between mouse and touch button mapping; resets the pointer state.
    pub fn set_touch(&mut self, touch: bool) {
        self.touch = touch;
        self.state = PointerState::None;
    }

    /// Where the pipeline should read the selection target, if anywhere.
    pub fn pick_position(&self) -> Option<(f32, f32)> {
        (self.state == PointerState::OnScene).then_some((self.position.x, self.position.y))
    }

    pub fn press(
        &mut self,
        button: PointerButton,
        position: Vec2,
        camera: &mut CameraModel,
        scene_viewport: ViewportRect,
        zoom_active: bool,
    ) {
        match button {
            PointerButton::Left if zoom_active => {
                self.state = if scene_viewport.contains(position.x, position.y) {
                    PointerState::OnOverview
                } else {
                    PointerState::OnZoom
                };
            }
            PointerButton::Left => {
                self.state = if self.touch {
                    PointerState::Rotating
                } else {
                    PointerState::OnScene
                };
                self.position = position;
            }
            PointerButton::Right => {
                self.state = if self.touch {
                    PointerState::OnScene
                } else {
                    PointerState::Rotating
                };
                self.position = position;
            }
            PointerButton::Middle => camera.reset_rotation(),
        }
        tracing::trace!(?button, state = ?self.state, "pointer press");
    }

    pub fn release(&mut self, position: Vec2) {
        if self.state == PointerState::Rotating {
            self.position = position;
        }
        self.state = PointerState::None;
    }

    /// Pointer motion; only rotates while [`PointerState::Rotating`].
    pub fn move_to(&mut self, position: Vec2, camera: &mut CameraModel) {
        if self.state != PointerState::Rotating {
            return;
        }
        let delta = position - self.position;
        camera.rotate_by(-delta.x * ROTATION_SPEED, delta.y * ROTATION_SPEED);
        self.position = position;
    }

    /// Wheel step in [`WHEEL_NOTCH`] units; zooms faster when close in.
    pub fn wheel(&mut self, delta: i32, camera: &mut CameraModel) {
        let zoom = camera.zoom_level();
        let step = if zoom > 100.0 {
            delta / 12
        } else if zoom > 50.0 {
            delta / 60
        } else {
            delta / WHEEL_NOTCH
        };
        camera.set_zoom_level(zoom + step as f32);
    }

    /// Two-finger update; zoom follows whether the fingers spread or close.
    pub fn pinch(&mut self, first: Vec2, second: Vec2, camera: &mut CameraModel) {
        self.state = PointerState::OnPinch;
        let d = first - second;
        let distance = (d.x.abs() + d.y.abs()) as i32;
        let zoom = camera.zoom_level();
        let rate = if zoom > 100.0 { 5.0 } else { 1.0 };
        let zoom = if distance > self.pinch_distance { zoom + rate } else { zoom - rate };
        camera.set_zoom_level(zoom);
        self.pinch_distance = distance;
    }

    pub fn double_tap(&mut self, position: Vec2, zoom_active: bool) {
        if !zoom_active {
            self.state = PointerState::OnScene;
            self.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(ctl: &mut InteractionController, button: PointerButton, zoom_active: bool) -> PointerState {
        let mut camera = CameraModel::new();
        let overview = ViewportRect::new(0, 400, 100, 100);
        ctl.press(button, Vec2::new(10.0, 450.0), &mut camera, overview, zoom_active);
        ctl.state()
    }

    #[test]
    fn test_press_states() {
        let mut mouse = InteractionController::new(false);
        assert_eq!(press(&mut mouse, PointerButton::Left, false), PointerState::OnScene);
        assert_eq!(mouse.pick_position(), Some((10.0, 450.0)));
        assert_eq!(press(&mut mouse, PointerButton::Right, false), PointerState::Rotating);
        assert_eq!(mouse.pick_position(), None);
        assert_eq!(press(&mut mouse, PointerButton::Left, true), PointerState::OnOverview);

        let mut camera = CameraModel::new();
        mouse.press(
            PointerButton::Left,
            Vec2::new(500.0, 10.0),
            &mut camera,
            ViewportRect::new(0, 400, 100, 100),
            true,
        );
        assert_eq!(mouse.state(), PointerState::OnZoom);
        mouse.release(Vec2::ZERO);
        assert_eq!(mouse.state(), PointerState::None);

        let mut touch = InteractionController::new(true);
        assert_eq!(press(&mut touch, PointerButton::Left, false), PointerState::Rotating);
        assert_eq!(press(&mut touch, PointerButton::Right, false), PointerState::OnScene);
    }

    #[test]
    fn test_rotation_only_while_rotating() {
        let mut ctl = InteractionController::new(false);
        let mut camera = CameraModel::new();
        let before = camera.rotation();
        ctl.move_to(Vec2::new(50.0, 50.0), &mut camera);
        assert_eq!(camera.rotation(), before);

        ctl.press(PointerButton::Right, Vec2::ZERO, &mut camera, ViewportRect::sized(100, 100), false);
        ctl.move_to(Vec2::new(-20.0, 10.0), &mut camera);
        assert_eq!(camera.rotation(), (before.0 + 10.0, before.1 + 5.0));

        ctl.press(PointerButton::Middle, Vec2::ZERO, &mut camera, ViewportRect::sized(100, 100), false);
        assert_eq!(camera.rotation(), (0.0, 45.0));
    }

    #[test]
    fn test_wheel_rates_and_clamp() {
        let mut ctl = InteractionController::new(false);
        let mut camera = CameraModel::new();
        ctl.wheel(WHEEL_NOTCH, &mut camera);
        assert_eq!(camera.zoom_level(), 102.0);
        ctl.wheel(WHEEL_NOTCH, &mut camera);
        assert_eq!(camera.zoom_level(), 112.0);

        camera.set_zoom_level(40.0);
        ctl.wheel(-WHEEL_NOTCH, &mut camera);
        assert_eq!(camera.zoom_level(), 39.0);
        // Less than a notch does nothing at low zoom
        ctl.wheel(60, &mut camera);
        assert_eq!(camera.zoom_level(), 39.0);

        camera.set_zoom_level(495.0);
        ctl.wheel(WHEEL_NOTCH * 10, &mut camera);
        assert_eq!(camera.zoom_level(), 500.0);
        camera.set_zoom_level(11.0);
        ctl.wheel(-WHEEL_NOTCH * 10, &mut camera);
        assert_eq!(camera.zoom_level(), 10.0);
    }

    #[test]
    fn test_pinch_follows_distance_trend() {
        let mut ctl = InteractionController::new(true);
        let mut camera = CameraModel::new();
        ctl.pinch(Vec2::ZERO, Vec2::new(10.0, 10.0), &mut camera);
        assert_eq!(camera.zoom_level(), 101.0);
        assert_eq!(ctl.state(), PointerState::OnPinch);
        ctl.pinch(Vec2::ZERO, Vec2::new(5.0, 5.0), &mut camera);
        assert_eq!(camera.zoom_level(), 96.0);
    }

    #[test]
    fn test_double_tap_ignored_when_zoomed() {
        let mut ctl = InteractionController::new(true);
        ctl.double_tap(Vec2::new(3.0, 4.0), true);
        assert_eq!(ctl.state(), PointerState::None);
        ctl.double_tap(Vec2::new(3.0, 4.0), false);
        assert_eq!(ctl.pick_position(), Some((3.0, 4.0)));
    }
}
