/// First-person fly camera driven by mouse look and WASD movement
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Camera defaults, as read from the `[camera]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    /// Degrees; -90 looks down -z
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second
    pub speed: f32,
    pub boost: f32,
    /// Degrees per pixel of mouse travel
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [-12.0, 16.0, 55.0],
            yaw: -90.0,
            pitch: 0.0,
            fov: 90.0,
            near: 0.1,
            far: 10000.0,
            speed: 30.0,
            boost: 3.0,
            sensitivity: 0.05,
        }
    }
}

/// Movement keys held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
}

impl Movement {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right)
    }

    /// Keys held in either
    pub fn union(self, other: Self) -> Self {
        Self {
            forward: self.forward || other.forward,
            backward: self.backward || other.backward,
            left: self.left || other.left,
            right: self.right || other.right,
            boost: self.boost || other.boost,
        }
    }
}

const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub boost: f32,
    pub sensitivity: f32,
    first_mouse: bool,
    last_x: f32,
    last_y: f32,
}

impl FlyCamera {
    pub fn new(settings: &CameraSettings, width: u32, height: u32) -> Self {
        let [x, y, z] = settings.position;
        let mut camera = Self {
            position: Point3::new(x, y, z),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            yaw: settings.yaw,
            pitch: settings.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: settings.fov,
            aspect: 4.0 / 3.0,
            near: settings.near,
            far: settings.far,
            speed: settings.speed,
            boost: settings.boost,
            sensitivity: settings.sensitivity,
            first_mouse: true,
            last_x: width as f32 / 2.0,
            last_y: height as f32 / 2.0,
        };
        camera.set_viewport(width, height);
        camera.update_front();
        camera
    }

    /// Mouse moved to `(x, y)` in screen coordinates, y growing downward.
    ///
    /// The first event only records the position so the view does not jump.
    pub fn process_mouse(&mut self, x: f32, y: f32) {
        if self.first_mouse {
            self.last_x = x;
            self.last_y = y;
            self.first_mouse = false;
        }

        let dx = x - self.last_x;
        let dy = self.last_y - y;
        self.last_x = x;
        self.last_y = y;

        self.rotate(dx * self.sensitivity, dy * self.sensitivity);
    }

    /// Turn by `dyaw`/`dpitch` degrees; pitch stays within ±89°
    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let direction = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = direction.normalize();
    }

    /// Right-hand vector of the current view
    pub fn right(&self) -> Vector3<f32> {
        self.front.cross(&self.up).normalize()
    }

    pub fn process_movement(&mut self, movement: Movement, dt: f32) {
        let mut step = self.speed * dt;
        if movement.boost {
            step *= self.boost;
        }

        if movement.forward {
            self.position += self.front * step;
        }
        if movement.backward {
            self.position -= self.front * step;
        }
        if movement.left {
            self.position -= self.right() * step;
        }
        if movement.right {
            self.position += self.right() * step;
        }
    }

    /// Framebuffer resized; zero sizes (minimized) are ignored
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &(self.position + self.front), &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// Project a point through `mvp` to screen space: `(x, y, depth)`.
    ///
    /// Points behind the near plane or past the far plane give `None`. Points
    /// beside the viewport are still returned so triangles crossing the edge
    /// can be clipped by the rasterizer.
    pub fn project_to_screen(
        point: &Point3<f32>,
        mvp: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let clip = mvp * point.to_homogeneous();

        // Prevent division by near-zero or negative w (behind the camera)
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(&CameraSettings::default(), 1024, 768)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).norm() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_camera_creation() {
        let camera = FlyCamera::default();
        assert!((camera.aspect - 1024.0 / 768.0).abs() < 1e-6);
        assert_close(camera.front, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.position, Point3::new(-12.0, 16.0, 55.0));
    }

    #[test]
    fn test_first_mouse_event_does_not_turn() {
        let mut camera = FlyCamera::default();
        camera.process_mouse(100.0, 700.0);
        assert_eq!(camera.yaw, -90.0);
        assert_eq!(camera.pitch, 0.0);

        // 20px right, 40px up
        camera.process_mouse(120.0, 660.0);
        assert!((camera.yaw - -89.0).abs() < 1e-5);
        assert!((camera.pitch - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.rotate(0.0, 500.0);
        assert_eq!(camera.pitch, 89.0);
        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch, -89.0);
        assert!(camera.front.y < -0.99);
    }

    #[test]
    fn test_movement() {
        let mut camera = FlyCamera::default();
        let start = camera.position;

        let forward = Movement {
            forward: true,
            ..Movement::default()
        };
        camera.process_movement(forward, 0.5);
        assert_close(camera.position - start, Vector3::new(0.0, 0.0, -15.0));

        let boosted_right = Movement {
            right: true,
            boost: true,
            ..Movement::default()
        };
        camera.process_movement(boosted_right, 0.1);
        assert_close(camera.position - start, Vector3::new(9.0, 0.0, -15.0));
        assert!(Movement::default().is_idle());
    }

    #[test]
    fn test_movement_union() {
        let left = Movement {
            left: true,
            ..Movement::default()
        };
        let boost = Movement {
            boost: true,
            ..Movement::default()
        };
        let both = left.union(boost);
        assert!(both.left && both.boost);
        assert!(!both.forward && !both.is_idle());
        assert!(boost.is_idle());
    }

    #[test]
    fn test_view_matrix() {
        let camera = FlyCamera::default();
        let view = camera.view_matrix();
        // The camera position maps to the view-space origin
        let origin = view.transform_point(&camera.position);
        assert!(origin.coords.norm() < 1e-4);
    }

    #[test]
    fn test_project_to_screen() {
        let camera = FlyCamera::default();
        let mvp = camera.projection_matrix() * camera.view_matrix();

        let ahead = camera.position + camera.front * 10.0;
        let (x, y, depth) = FlyCamera::project_to_screen(&ahead, &mvp, 80, 40).unwrap();
        assert!((x - 40.0).abs() < 1e-3);
        assert!((y - 20.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);

        let behind = camera.position - camera.front * 10.0;
        assert!(FlyCamera::project_to_screen(&behind, &mvp, 80, 40).is_none());
    }

    #[test]
    fn test_zero_viewport_keeps_aspect() {
        let mut camera = FlyCamera::default();
        camera.set_viewport(0, 10);
        assert!((camera.aspect - 1024.0 / 768.0).abs() < 1e-6);
        camera.set_viewport(200, 100);
        assert_eq!(camera.aspect, 2.0);
    }
}
