//! CPU raytracer for the ground-plane scene.
//!
//! Rays are cast from the camera through each pixel center and intersected analytically
//! with the ground plane `y = 0` and, optionally, a vertical [`Cylinder`]. Surfaces are
//! shaded with an XOR [`checkerboard`] pattern; there is no lighting.
//!
//! Tracing a pixel is a pure function of the scene, the camera matrices, and the pixel
//! position, so disjoint [`Region`]s can be traced concurrently without coordination.

mod ray;
pub use ray::Ray;

mod renderer;
pub use renderer::{Region, RegionInfo, trace_image, trace_pixel, trace_region};

mod scene;
pub use scene::{Background, CHECKER_FREQUENCY, Cylinder, Scene, checkerboard};
