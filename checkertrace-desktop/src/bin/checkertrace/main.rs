//! Binary for the checkertrace demo.

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::Parser as _;

use checkertrace_desktop::camera_path::{CameraPath, CameraPathRecorder};
use checkertrace_desktop::{DemoSession, TITLE, image_file, logging, record};

mod command_options;
use command_options::{DemoArgs, GraphicsType};

fn title_and_version() -> String {
    format!("{TITLE} v{v}", v = clap::crate_version!())
}

fn main() -> Result<(), anyhow::Error> {
    // Parse and transform command-line arguments.
    let options = DemoArgs::parse();
    // Destructure as a check that we're using/skipping all the args
    let DemoArgs {
        graphics: graphics_type,
        display_size: _, // used in RecordOptions
        duration: _,     // used in RecordOptions and animation_options()
        fps: _,          // ditto
        output_file: _,  // used in RecordOptions
        play_camera_path,
        record_camera_path,
        title_image,
        logging: logging_args,
        settings: settings_args,
    } = options.clone();

    logging::install(&logging_args)?;
    log::debug!("{}", title_and_version());

    let config = settings_args.build_config()?;
    let animation = options.animation_options()?;

    // Done with options; now start creating the session.

    let start_session_time = Instant::now();
    let title_image = title_image
        .map(|path| image_file::load_png(&path))
        .transpose()
        .context("failed to load title image")?;
    let playback = match play_camera_path {
        Some(path) => {
            let camera_path = CameraPath::load(&path)?;
            if camera_path.is_empty() {
                log::warn!(
                    "camera path {path} contains no frames; camera will not move",
                    path = path.display()
                );
            }
            Some(camera_path)
        }
        None => None,
    };
    let mut session = DemoSession::new(config.clone(), title_image.as_ref(), playback)
        .context("failed to create session")?;
    if let Some(path) = record_camera_path {
        session.set_camera_recorder(CameraPathRecorder::create(
            &path,
            Duration::from_millis(config.camera_record_interval_ms),
        )?);
    }
    log::debug!(
        "Initialized session ({:.3} s)",
        start_session_time.elapsed().as_secs_f32()
    );

    match graphics_type {
        GraphicsType::Headless => {
            let (frame_count, frame_period) = match &animation {
                Some(animation) => (animation.frame_count, animation.frame_period),
                None => (1, Duration::ZERO),
            };
            record::headless_main(session, frame_count, frame_period)?;
            Ok(())
        }
        GraphicsType::Record => {
            let record_options = options
                .record_options(&config)?
                .context("--output is required for recording")?;
            record::record_main(session, &record_options)
        }
    }
}
