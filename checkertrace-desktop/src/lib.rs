//! Components of the `checkertrace` demo program: the per-frame [`DemoSession`], its
//! configuration, camera path files, and PNG input and output.
//!
//! This library exists mainly so that the `checkertrace` binary's parts can be tested;
//! it is not designed for general reuse.

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

pub mod camera_path;
mod config_files;
pub use config_files::{CameraModeSetting, DemoConfig, SceneSetting, SettingsArgs};
mod demo;
pub use demo::{DemoSession, FrameReport};
pub mod image_file;
pub mod logging;
pub mod record;

/// Name of the program, for window titles and messages.
pub const TITLE: &str = "checkertrace";
