//! Camera component
//!
//! A camera renders the scene into a normalized sub-rectangle of the window.
//! Its view matrix is the inverse of the owning node's world transform, so
//! moving or rotating the node moves the camera.
//!
//! Every frame an attached camera registers a snapshot of itself with the
//! [`Renderer`](crate::render::Renderer); the renderer draws larger viewports
//! first.

use std::any::Any;

use crate::foundation::math::{constants, projection, Mat4};
use crate::scene::component::{Component, ComponentKind, FrameContext, TypedComponent, DEFAULT_PRIORITY};

/// Camera configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CameraError {
    /// Viewport bounds outside [0, 1] or not strictly increasing
    #[error("invalid viewport: start {start:?}, end {end:?}")]
    InvalidViewport {
        /// Requested lower-left corner
        start: (f32, f32),
        /// Requested upper-right corner
        end: (f32, f32),
    },

    /// Field of view outside (0, π)
    #[error("field of view {0} outside (0, π)")]
    InvalidFov(f32),

    /// Clip planes must satisfy `far > near > 0`
    #[error("invalid clip planes: far {far}, near {near}")]
    InvalidPlanes {
        /// Far plane distance
        far: f32,
        /// Near plane distance
        near: f32,
    },
}

/// Normalized viewport rectangle, `(0, 0)` bottom-left to `(1, 1)` top-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    start: (f32, f32),
    end: (f32, f32),
}

impl Viewport {
    /// Validate and create a viewport
    pub fn new(start: (f32, f32), end: (f32, f32)) -> Result<Self, CameraError> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        let valid = in_range(start.0)
            && in_range(start.1)
            && in_range(end.0)
            && in_range(end.1)
            && start.0 < end.0
            && start.1 < end.1;

        if valid {
            Ok(Self { start, end })
        } else {
            Err(CameraError::InvalidViewport { start, end })
        }
    }

    /// The whole window
    pub fn full() -> Self {
        Self {
            start: (0.0, 0.0),
            end: (1.0, 1.0),
        }
    }

    /// Lower-left corner
    pub fn start(&self) -> (f32, f32) {
        self.start
    }

    /// Upper-right corner
    pub fn end(&self) -> (f32, f32) {
        self.end
    }

    /// Normalized area
    pub fn area(&self) -> f32 {
        (self.end.0 - self.start.0) * (self.end.1 - self.start.1)
    }

    /// Pixel rectangle for a window of `resolution`
    ///
    /// Bounds are truncated toward zero, so a viewport that is valid in
    /// normalized space can still be degenerate on a tiny window.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn to_pixels(&self, resolution: (u32, u32)) -> PixelViewport {
        let (width, height) = (resolution.0 as f32, resolution.1 as f32);
        let start_x = (self.start.0 * width) as i32;
        let start_y = (self.start.1 * height) as i32;
        let end_x = (self.end.0 * width) as i32;
        let end_y = (self.end.1 * height) as i32;

        PixelViewport {
            x: start_x,
            y: start_y,
            width: (end_x - start_x).max(0) as u32,
            height: (end_y - start_y).max(0) as u32,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::full()
    }
}

/// Viewport in window pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelViewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelViewport {
    /// Whether the rectangle covers no pixels
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Projection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Parallel projection sized in viewport pixels
    #[default]
    Orthographic,
    /// Perspective projection using the vertical field of view
    Perspective,
}

/// Camera component
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    viewport: Viewport,
    mode: ProjectionMode,
    far: f32,
    near: f32,
    fov: f32,
    priority: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            viewport: Viewport::full(),
            mode: ProjectionMode::Orthographic,
            far: 100.0,
            near: 0.1,
            fov: constants::HALF_PI,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl Camera {
    /// Create a camera, validating planes and field of view
    pub fn new(viewport: Viewport, mode: ProjectionMode, far: f32, near: f32, fov: f32) -> Result<Self, CameraError> {
        if !valid_planes(far, near) {
            return Err(CameraError::InvalidPlanes { far, near });
        }
        if !valid_fov(fov) {
            return Err(CameraError::InvalidFov(fov));
        }

        Ok(Self {
            viewport,
            mode,
            far,
            near,
            fov,
            priority: DEFAULT_PRIORITY,
        })
    }

    /// Set the component priority
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport from raw bounds; returns `false` and keeps the old one if invalid
    pub fn set_viewport(&mut self, start: (f32, f32), end: (f32, f32)) -> bool {
        match Viewport::new(start, end) {
            Ok(viewport) => {
                self.viewport = viewport;
                true
            }
            Err(err) => {
                log::warn!("Rejected camera viewport: {err}");
                false
            }
        }
    }

    /// Projection mode
    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Switch projection mode
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    /// Far plane distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Near plane distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Set both clip planes; returns `false` unless `far > near > 0`
    pub fn set_far_near(&mut self, far: f32, near: f32) -> bool {
        if !valid_planes(far, near) {
            return false;
        }
        self.far = far;
        self.near = near;
        true
    }

    /// Vertical field of view in radians
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Set the field of view; returns `false` unless it lies in (0, π)
    pub fn set_fov(&mut self, fov: f32) -> bool {
        if !valid_fov(fov) {
            return false;
        }
        self.fov = fov;
        true
    }

    /// Projection matrix for the viewport's pixel rectangle
    #[allow(clippy::cast_precision_loss)]
    pub fn projection_matrix(&self, viewport: PixelViewport) -> Mat4 {
        match self.mode {
            ProjectionMode::Orthographic => {
                projection::orthographic(viewport.width, viewport.height, self.near, self.far)
            }
            ProjectionMode::Perspective => {
                let aspect = viewport.width as f32 / viewport.height.max(1) as f32;
                projection::perspective(self.fov, aspect, self.near, self.far)
            }
        }
    }

    /// View matrix for a camera placed at `owner_world`
    pub fn view_matrix(&self, owner_world: &Mat4) -> Mat4 {
        owner_world.try_inverse().unwrap_or_else(|| {
            log::warn!("Camera owner transform is not invertible; using identity view");
            Mat4::identity()
        })
    }
}

fn valid_planes(far: f32, near: f32) -> bool {
    near > 0.0 && far > near
}

fn valid_fov(fov: f32) -> bool {
    fov > 0.0 && fov < constants::PI
}

impl Component for Camera {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Camera
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn frame_start(&mut self, ctx: &mut FrameContext<'_>) {
        let world = *ctx.world_transform();
        ctx.renderer().add_camera(self.clone(), world);
    }

    fn clone_box(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedComponent for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new((0.0, 0.0), (1.0, 1.0)).is_ok());
        assert!(Viewport::new((0.5, 0.5), (0.5, 1.0)).is_err());
        assert!(Viewport::new((0.6, 0.0), (0.5, 1.0)).is_err());
        assert!(Viewport::new((0.0, 0.0), (1.5, 1.0)).is_err());
        assert!(Viewport::new((-0.1, 0.0), (1.0, 1.0)).is_err());
    }

    #[test]
    fn test_viewport_area_and_pixels() {
        let quadrant = Viewport::new((0.5, 0.5), (1.0, 1.0)).unwrap();
        assert_relative_eq!(quadrant.area(), 0.25);
        assert_relative_eq!(Viewport::full().area(), 1.0);

        let pixels = quadrant.to_pixels((800, 600));
        assert_eq!(
            pixels,
            PixelViewport {
                x: 400,
                y: 300,
                width: 400,
                height: 300
            }
        );
        assert!(!pixels.is_degenerate());
    }

    #[test]
    fn test_tiny_window_gives_degenerate_pixels() {
        let sliver = Viewport::new((0.0, 0.0), (0.1, 1.0)).unwrap();
        assert!(sliver.to_pixels((5, 100)).is_degenerate());
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::default();
        assert_eq!(camera.viewport(), Viewport::full());
        assert_eq!(camera.projection_mode(), ProjectionMode::Orthographic);
        assert_relative_eq!(camera.near(), 0.1);
        assert_relative_eq!(camera.far(), 100.0);
        assert_relative_eq!(camera.fov(), constants::HALF_PI);
    }

    #[test]
    fn test_constructor_rejects_bad_parameters() {
        let full = Viewport::full();
        assert!(matches!(
            Camera::new(full, ProjectionMode::Perspective, 1.0, 10.0, 1.0),
            Err(CameraError::InvalidPlanes { .. })
        ));
        assert!(matches!(
            Camera::new(full, ProjectionMode::Perspective, 10.0, 1.0, constants::PI),
            Err(CameraError::InvalidFov(_))
        ));
        assert!(Camera::new(full, ProjectionMode::Perspective, 10.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_setters_reject_and_keep_previous_values() {
        let mut camera = Camera::default();

        assert!(!camera.set_far_near(1.0, 1.0));
        assert!(!camera.set_far_near(10.0, 0.0));
        assert!(camera.set_far_near(50.0, 0.5));
        assert_relative_eq!(camera.far(), 50.0);

        assert!(!camera.set_fov(0.0));
        assert!(!camera.set_fov(constants::PI));
        assert!(camera.set_fov(1.2));
        assert_relative_eq!(camera.fov(), 1.2);

        assert!(!camera.set_viewport((0.5, 0.0), (0.5, 1.0)));
        assert_eq!(camera.viewport(), Viewport::full());
        assert!(camera.set_viewport((0.0, 0.0), (0.5, 0.5)));
        assert_relative_eq!(camera.viewport().area(), 0.25);
    }

    #[test]
    fn test_view_matrix_inverts_owner_transform() {
        let camera = Camera::default();
        let owner = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0));
        let view = camera.view_matrix(&owner);

        assert_relative_eq!(view * owner, Mat4::identity(), epsilon = 1e-6);
        assert_relative_eq!(camera.view_matrix(&Mat4::zeros()), Mat4::identity());
    }

    #[test]
    fn test_perspective_projection_uses_aspect() {
        let mut camera = Camera::default();
        camera.set_projection_mode(ProjectionMode::Perspective);
        let pixels = PixelViewport {
            x: 0,
            y: 0,
            width: 200,
            height: 100,
        };
        let proj = camera.projection_matrix(pixels);

        // fov = π/2 -> cot(fov/2) = 1
        assert_relative_eq!(proj[(1, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(proj[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(proj[(3, 2)], -1.0);
    }
}
