pub mod director;
pub mod projection;

pub use director::{ease_out_cubic, CameraDirector, CameraFlight, CameraMotion};
pub use projection::{Camera, CameraRig, Ray, ScreenPoint, Viewport};
