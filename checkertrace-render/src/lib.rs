//! Raytracer, job scheduler, and framebuffer effects for the checkertrace demo.
//!
//! A frame is produced in these stages:
//!
//! 1. The caller positions a [`camera::Camera`] and calls [`camera::Camera::update()`].
//! 2. [`scheduler::JobScheduler::dispatch_frame()`] splits the [`Image`] into row bands and
//!    raytraces them on a fixed pool of worker threads, returning once every band is done.
//! 3. [`splat::PlotPixels::splat()`] draws a point cloud over the traced image.
//! 4. The [`filters`] distort and blur the result.
//!
//! ## Package features
//!
//! This package, `checkertrace-render`, defines the following feature flags:
//!
//! * `"auto-threads"`:
//!   Run the [`filters`] in parallel using [`rayon`]’s global thread pool.
//!   This feature does not affect the public API, only performance and dependencies.
//!   The raytracing [`scheduler`] uses its own threads regardless.

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

// -------------------------------------------------------------------------------------------------

/// Re-export of the math types this crate's API is expressed in.
pub use checkertrace_base::math;

pub mod camera;

pub mod filters;

mod flaws;
pub use flaws::Flaws;

mod image;
pub use image::{Image, ImageError};

pub mod raytracer;

pub mod scheduler;

pub mod splat;
