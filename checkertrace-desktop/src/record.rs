//! Running the demo without a display: recording frames to a PNG file, or only
//! measuring how long they take.

use std::fs::File;
use std::io::{self, BufWriter, Write as _};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;

use checkertrace_render::Flaws;

use crate::DemoSession;
use crate::image_file::{PngAnimation, new_png_writer};
use crate::logging::new_progress_bar;

/// Options for [`record_main()`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct RecordOptions {
    /// File to write. It is a plain PNG if there is one frame, and an animated PNG
    /// otherwise.
    pub output_path: PathBuf,
    /// Size of the written frames; the rendered image is scaled to fit.
    pub image_size: [usize; 2],
    /// Present if more than one frame is to be recorded.
    pub animation: Option<RecordAnimationOptions>,
}

/// Frame timing of a recording.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct RecordAnimationOptions {
    #[allow(missing_docs)]
    pub frame_count: usize,
    /// Demo time between consecutive frames.
    pub frame_period: Duration,
}

impl RecordOptions {
    #[allow(missing_docs)]
    pub fn new(
        output_path: PathBuf,
        image_size: [usize; 2],
        animation: Option<RecordAnimationOptions>,
    ) -> Self {
        Self {
            output_path,
            image_size,
            animation,
        }
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.animation.as_ref().map_or(1, |a| a.frame_count)
    }

    pub(crate) fn frame_period(&self) -> Duration {
        self.animation
            .as_ref()
            .map_or(Duration::ZERO, |a| a.frame_period)
    }
}

impl RecordAnimationOptions {
    /// Options for `frame_count` frames at `fps` frames per second.
    pub fn new(frame_count: usize, fps: f64) -> Result<Self, anyhow::Error> {
        if !(fps.is_finite() && fps > 0.0) {
            anyhow::bail!("frame rate must be positive (got {fps})");
        }
        Ok(Self {
            frame_count,
            frame_period: Duration::from_secs_f64(fps.recip()),
        })
    }

    /// Options for the number of frames at `fps` nearest to covering `duration`, and at
    /// least one.
    pub fn for_duration(duration: Duration, fps: f64) -> Result<Self, anyhow::Error> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frame_count = (duration.as_secs_f64() * fps).round().max(1.0) as usize;
        Self::new(frame_count, fps)
    }

    /// Demo time covered by the whole recording.
    pub fn total_duration(&self) -> Duration {
        self.frame_period * u32::try_from(self.frame_count).unwrap_or(u32::MAX)
    }

    fn png_animation(&self) -> Result<PngAnimation, anyhow::Error> {
        Ok(PngAnimation {
            frame_count: u32::try_from(self.frame_count).context("too many frames for APNG")?,
            frame_delay_ms: u16::try_from(self.frame_period.as_millis())
                .context("frame period too long for APNG")?,
        })
    }
}

/// Renders frames at fixed time steps and writes them to the output file.
///
/// Rendering happens on the calling thread (and the raytracing workers) while a separate
/// thread encodes and writes the PNG data. The output file is created before rendering
/// starts, so an unwritable path fails early.
pub fn record_main(mut session: DemoSession, options: &RecordOptions) -> Result<(), anyhow::Error> {
    let [width, height] = options.image_size;
    let frame_count = options.frame_count();
    if frame_count == 0 {
        anyhow::bail!("nothing to record: frame count is zero");
    }
    let animation = options
        .animation
        .as_ref()
        .map(RecordAnimationOptions::png_animation)
        .transpose()?;

    let file = File::create(&options.output_path).with_context(|| {
        format!(
            "failed to create output file {}",
            options.output_path.display()
        )
    })?;

    let (frame_sender, frame_receiver) = mpsc::sync_channel::<(usize, Vec<u8>)>(2);
    let (status_sender, status_receiver) = mpsc::channel::<usize>();
    let writer_thread = thread::Builder::new()
        .name("png-writer".to_owned())
        .spawn(move || -> Result<(), io::Error> {
            let mut buf_writer = BufWriter::new(file);
            {
                let mut png_writer = new_png_writer(&mut buf_writer, width, height, animation)?;
                while let Ok((frame_number, data)) = frame_receiver.recv() {
                    png_writer.write_image_data(&data)?;
                    let _ = status_sender.send(frame_number);
                }
                png_writer.finish()?;
            }
            let file = buf_writer.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.sync_all()
        })
        .context("failed to start PNG writer thread")?;

    let progress_bar = new_progress_bar(frame_count as u64).with_prefix("Drawing");
    let mut stale_frames = 0;
    for frame_number in 0..frame_count {
        if frame_number > 0 {
            session.advance(options.frame_period())?;
        }
        let report = session.render_frame()?;
        if report.flaws.contains(Flaws::STALE_FRAME) {
            stale_frames += 1;
        }
        let scaled = session.image().scaled_nearest(width, height);
        if frame_sender
            .send((frame_number, scaled.to_rgba8_top_down()))
            .is_err()
        {
            // The writer stopped early; its error is reported below.
            break;
        }
        while let Ok(written) = status_receiver.try_recv() {
            progress_bar.set_position(written as u64 + 1);
        }
    }
    drop(frame_sender);

    // Sending is done; wait for the writer to catch up.
    while let Ok(written) = status_receiver.recv() {
        progress_bar.set_position(written as u64 + 1);
    }
    progress_bar.finish();
    match writer_thread.join() {
        Ok(result) => result.with_context(|| {
            format!("failed to write {}", options.output_path.display())
        })?,
        Err(_) => anyhow::bail!("PNG writer thread panicked"),
    }

    if stale_frames > 0 {
        log::warn!("{stale_frames} of {frame_count} frames repeat the previous image");
    }
    let _ = writeln!(
        std::io::stderr(),
        "\nWrote {}",
        options.output_path.to_string_lossy()
    );
    Ok(())
}

/// Summary of a [`headless_main()`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct HeadlessSummary {
    #[allow(missing_docs)]
    pub frames: usize,
    /// Frames which were not raytraced and repeat the previous image.
    pub stale_frames: usize,
    /// Total wall-clock time spent rendering.
    pub render_time: Duration,
    /// Longest time spent on one frame.
    pub slowest_frame: Duration,
}

impl HeadlessSummary {
    /// Mean frames per second of rendering, or zero if nothing was rendered.
    pub fn frames_per_second(&self) -> f64 {
        let seconds = self.render_time.as_secs_f64();
        if seconds > 0.0 {
            self.frames as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Renders `frame_count` frames `frame_period` of demo time apart, discarding the
/// images, and logs how long they took.
pub fn headless_main(
    mut session: DemoSession,
    frame_count: usize,
    frame_period: Duration,
) -> Result<HeadlessSummary, anyhow::Error> {
    let start = Instant::now();
    let mut summary = HeadlessSummary::default();
    for frame_number in 0..frame_count {
        if frame_number > 0 {
            session.advance(frame_period)?;
        }
        let report = session.render_frame()?;
        summary.frames += 1;
        if report.flaws.contains(Flaws::STALE_FRAME) {
            summary.stale_frames += 1;
        }
        summary.slowest_frame = summary.slowest_frame.max(report.elapsed);
    }
    summary.render_time = start.elapsed();

    log::info!(
        "rendered {frames} frames in {time:.2?} ({fps:.1} frames/s, slowest {slowest:.2?}){stale}",
        frames = summary.frames,
        time = summary.render_time,
        fps = summary.frames_per_second(),
        slowest = summary.slowest_frame,
        stale = if summary.stale_frames > 0 {
            format!(", {} stale", summary.stale_frames)
        } else {
            String::new()
        },
    );
    Ok(summary)
}
