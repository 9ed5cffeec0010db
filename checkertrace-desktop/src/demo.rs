use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use anyhow::Context as _;

use checkertrace_render::camera::{Camera, Viewport};
use checkertrace_render::math::{Matrix4x4f, Vector3, Vector3f};
use checkertrace_render::raytracer::Scene;
use checkertrace_render::scheduler::{DispatchError, FrameInfo, JobScheduler};
use checkertrace_render::splat::{PlotPixels, SplatInfo};
use checkertrace_render::{Flaws, Image, filters};

use crate::camera_path::{CameraPath, CameraPathRecorder};
use crate::config_files::{CameraModeSetting, DemoConfig};

/// Where the title image's point cloud is placed, and its size in world units.
const TITLE_ORIGIN: Vector3f = Vector3::new(-2.0, -4.0, 0.0);
const TITLE_SIZE: f32 = 4.0;

const SPHERE_RADIUS: f32 = 4.0;

/// Everything needed to produce the demo's frames, one after another.
///
/// Each frame is raytraced by the job scheduler, overlaid with a point cloud, and then
/// distorted and blurred according to the demo time.
#[derive(Debug)]
pub struct DemoSession {
    config: DemoConfig,
    scheduler: JobScheduler,
    camera: Camera,
    camera_mode: CameraModeSetting,
    scene: Scene,
    points: PlotPixels,

    /// Output of the most recent frame.
    screen: Image,
    /// Intermediate buffer for the filters.
    scratch: Image,

    demo_time: Duration,
    frames_rendered: usize,
    playback: Option<CameraPath>,
    recorder: Option<CameraPathRecorder>,
}

/// What happened while rendering one frame, from [`DemoSession::render_frame()`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct FrameReport {
    /// Demo time the frame shows.
    pub demo_time: Duration,
    /// Raytracing statistics, or [`None`] if the frame was not raytraced and the
    /// previous image was kept.
    pub trace: Option<FrameInfo>,
    #[allow(missing_docs)]
    pub splat: SplatInfo,
    /// Summary of the ways this frame is inaccurate.
    pub flaws: Flaws,
    /// Wall-clock time spent on the whole frame.
    pub elapsed: Duration,
}

impl DemoSession {
    /// Creates a session at demo time zero.
    ///
    /// The point cloud shows `title_image` if given, and otherwise a sphere. If a
    /// `playback` path is given, the camera follows it regardless of the configured
    /// camera mode.
    pub fn new(
        config: DemoConfig,
        title_image: Option<&Image>,
        playback: Option<CameraPath>,
    ) -> Result<Self, anyhow::Error> {
        let [width, height] = config.render_size;
        if width == 0 || height == 0 {
            anyhow::bail!("render size must not be zero (got {width}×{height})");
        }

        let scheduler = JobScheduler::new(config.scheduler_options())
            .context("failed to start raytracing workers")?;

        let camera_mode = if playback.is_some() {
            CameraModeSetting::Free
        } else {
            config.camera_mode
        };
        let mut camera = match camera_mode {
            CameraModeSetting::Orbit => Camera::looking_at(orbit_position(0.0), Vector3::zero()),
            CameraModeSetting::Free => {
                let mut camera = Camera::free(Matrix4x4f::identity());
                camera.translate_local(Vector3::new(0.0, -1.0, 0.0));
                camera
            }
        };
        camera.set_fov_y(config.fov_degrees.to_radians());
        camera.set_aspect_ratio(Viewport::new(width, height).aspect_ratio());

        let points = match title_image {
            Some(image) => PlotPixels::plot_image(TITLE_ORIGIN, image, TITLE_SIZE, TITLE_SIZE),
            None => PlotPixels::generate_sphere(Vector3::zero(), SPHERE_RADIUS, config.sphere_points),
        };
        log::debug!(
            "demo session: {width}×{height}, {n} points, camera {camera_mode:?}",
            n = points.len()
        );

        Ok(Self {
            scene: config.scene(),
            scheduler,
            camera,
            camera_mode,
            points,
            screen: Image::new(width, height),
            scratch: Image::new(width, height),
            demo_time: Duration::ZERO,
            frames_rendered: 0,
            playback,
            recorder: None,
            config,
        })
    }

    /// Starts writing the camera's view to a camera path file as the demo advances.
    pub fn set_camera_recorder(&mut self, recorder: CameraPathRecorder) {
        self.recorder = Some(recorder);
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current demo time.
    pub fn demo_time(&self) -> Duration {
        self.demo_time
    }

    /// Whether the demo time has passed the configured demo length.
    pub fn is_finished(&self) -> bool {
        self.demo_time.as_secs_f32() >= self.config.demo_length
    }

    /// The most recently rendered frame, with row 0 at the bottom.
    pub fn image(&self) -> &Image {
        &self.screen
    }

    /// Moves demo time forward by `dt`, and records the camera's current view if a
    /// recorder is set.
    pub fn advance(&mut self, dt: Duration) -> Result<(), anyhow::Error> {
        self.demo_time += dt;
        if let Some(recorder) = &mut self.recorder {
            recorder.record(self.demo_time, &self.camera.view())?;
        }
        Ok(())
    }

    /// Renders the frame for the current demo time into [`Self::image()`].
    ///
    /// If the camera cannot be used, or raytracing times out or is still busy with a frame
    /// that timed out, the previous image is kept and the report carries
    /// [`Flaws::STALE_FRAME`]. Only failures that would recur on every frame are returned
    /// as errors.
    pub fn render_frame(&mut self) -> Result<FrameReport, anyhow::Error> {
        let start = Instant::now();
        let t = self.demo_time.as_secs_f32();
        self.position_camera(t);

        let trace = match self.camera.update() {
            Ok(()) => {
                match self
                    .scheduler
                    .dispatch_frame(&mut self.screen, &self.camera, &self.scene)
                {
                    Ok(info) => Some(info),
                    Err(
                        error @ (DispatchError::Camera(_)
                        | DispatchError::Backlog { .. }
                        | DispatchError::Timeout { .. }),
                    ) => {
                        log::warn!("frame at t={t:.2}s not rendered: {error}");
                        None
                    }
                    Err(error) => {
                        return Err(anyhow::Error::new(error).context("failed to raytrace frame"));
                    }
                }
            }
            Err(error) => {
                log::warn!("camera update failed at t={t:.2}s: {error}");
                None
            }
        };

        let Some(trace) = trace else {
            return Ok(FrameReport {
                demo_time: self.demo_time,
                trace: None,
                splat: SplatInfo::default(),
                flaws: Flaws::STALE_FRAME,
                elapsed: start.elapsed(),
            });
        };

        let splat = self.points.splat(&mut self.screen, &self.camera.matrices()?);
        self.apply_filters(t);

        self.frames_rendered += 1;
        let elapsed = start.elapsed();
        log::debug!(
            "frame {n} t={t:.2}s: {elapsed:.2?} total, {trace_time:.2?} raytracing, \
            {points} points splatted{flaws}",
            n = self.frames_rendered,
            trace_time = trace.elapsed,
            points = splat.points - splat.points_skipped,
            flaws = if trace.flaws.is_empty() {
                String::new()
            } else {
                format!(", flaws: {}", trace.flaws)
            },
        );
        Ok(FrameReport {
            demo_time: self.demo_time,
            trace: Some(trace),
            splat,
            flaws: trace.flaws,
            elapsed,
        })
    }

    fn position_camera(&mut self, t: f32) {
        match self.camera_mode {
            CameraModeSetting::Orbit => self.camera.set_position(orbit_position(t)),
            CameraModeSetting::Free => {
                if let Some(view) = self.playback.as_ref().and_then(|path| path.get(t)) {
                    self.camera.set_view_matrix(view);
                }
            }
        }
    }

    /// Wobbles and blurs `self.screen`, using `self.scratch` as the intermediate.
    fn apply_filters(&mut self, t: f32) {
        let config = &self.config;
        let amplitude = (t / config.demo_length * config.wobble_strength_scale)
            .min(config.wobble_amplitude)
            .max(0.0);

        filters::wobble(&mut self.scratch, &self.screen, t * 30.0, t * 23.4, amplitude);
        filters::blur_horizontal(&mut self.screen, &self.scratch);

        if t > config.blur_start {
            for _ in 0..config.blur_passes {
                filters::blur_horizontal(&mut self.scratch, &self.screen);
                filters::blur_horizontal(&mut self.screen, &self.scratch);
                filters::blur_vertical(&mut self.scratch, &self.screen);
                filters::blur_vertical(&mut self.screen, &self.scratch);
            }
        }
    }
}

/// Camera position in orbit mode at demo time `t` seconds: circling the Y axis at radius
/// 10 once every 10 seconds, bobbing between heights 7 and 13.
pub(crate) fn orbit_position(t: f32) -> Vector3f {
    let angle = TAU * t;
    Vector3::new(
        (angle * 0.1).cos() * 10.0,
        (angle * 0.2).sin() * 3.0 + 10.0,
        (angle * 0.1).sin() * 10.0,
    )
}
