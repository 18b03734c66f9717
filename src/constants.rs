pub const WINDOW_WIDTH: i32 = 1280;           // Initial window width
pub const WINDOW_HEIGHT: i32 = 720;           // Initial window height
pub const FPS: u32 = 60;                      // Target frames per second

pub const SPHERE_RADIUS: f32 = 50.0;          // Radius of the viewing sphere
pub const SPHERE_RINGS: i32 = 64;             // Latitude subdivisions
pub const SPHERE_SLICES: i32 = 64;            // Longitude subdivisions
pub const FIELD_OF_VIEW: f32 = 70.0;          // Vertical field of view (degrees)

pub const FADE_SPEED: f32 = 2.0;              // Overlay opacity change per second
pub const LOOK_SENSITIVITY: f32 = 0.15;       // Degrees of rotation per pixel dragged
pub const VERTICAL_ANGLE_CLAMP: f32 = 85.0;   // Max pitch above/below the horizon (degrees)
