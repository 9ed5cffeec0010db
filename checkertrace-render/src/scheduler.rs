//! Parallel raytracing on a fixed pool of worker threads.
//!
//! Each frame, [`JobScheduler::dispatch_frame()`] splits the image into horizontal bands
//! (see [`partition_rows()`]), queues one job per band, and blocks until every job of the
//! frame has finished. Jobs own copies of everything they read (the camera matrices and
//! scene are small `Copy` values) and produce their band's pixels into their own buffer,
//! so workers never share mutable state except the per-frame completion barrier.

use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::Flaws;
use crate::Image;
use crate::camera::{Camera, CameraError, Viewport};
use crate::raytracer::{Region, RegionInfo, Scene, trace_region};

/// Configuration for a [`JobScheduler`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct SchedulerOptions {
    /// Number of worker threads. Must be at least 1.
    pub worker_count: usize,

    /// Number of bands each frame is split into. Must be at least 1.
    ///
    /// Using more bands than workers helps balance load when some bands are slower to trace
    /// than others.
    pub slice_count: usize,

    /// Maximum number of jobs that may be queued at once, or [`None`] for no limit.
    ///
    /// A frame needing more jobs than this fails with [`DispatchError::QueueCapacity`]
    /// instead of dropping work. A frame that would fit, but not alongside jobs still
    /// queued from an earlier timed-out frame, fails with [`DispatchError::Backlog`].
    pub queue_capacity: Option<usize>,

    /// How long [`JobScheduler::dispatch_frame()`] waits for a frame's jobs before giving up
    /// with [`DispatchError::Timeout`], or [`None`] to wait indefinitely.
    ///
    /// Jobs of a frame that timed out and have not started yet are discarded by the workers
    /// without being run.
    pub frame_timeout: Option<Duration>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            worker_count: 2,
            slice_count: 8,
            queue_capacity: None,
            frame_timeout: None,
        }
    }
}

impl SchedulerOptions {
    fn validate(&self) -> Result<(), SchedulerError> {
        if self.worker_count == 0 {
            return Err(SchedulerError::InvalidOptions("worker_count must be at least 1"));
        }
        if self.slice_count == 0 {
            return Err(SchedulerError::InvalidOptions("slice_count must be at least 1"));
        }
        if self.queue_capacity == Some(0) {
            return Err(SchedulerError::InvalidOptions(
                "queue_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Splits an image of the given size into `slice_count` full-width bands.
///
/// Band `i` covers rows `height * i / slice_count` up to (excluding)
/// `height * (i + 1) / slice_count`, so the bands are contiguous, do not overlap, and
/// together cover every row. If there are more bands than rows, some bands are empty.
///
/// Panics if `slice_count` is zero.
pub fn partition_rows(width: usize, height: usize, slice_count: usize) -> Vec<Region> {
    assert!(slice_count > 0, "slice_count must be at least 1");
    (0..slice_count)
        .map(|i| {
            let y0 = height * i / slice_count;
            let y1 = height * (i + 1) / slice_count;
            Region {
                x: 0,
                y: y0,
                width,
                height: y1 - y0,
            }
        })
        .collect()
}

/// Runs raytracing jobs on a fixed pool of worker threads.
///
/// The threads are started by [`JobScheduler::new()`] and live until the scheduler is
/// dropped, at which point the queue is closed and the threads are joined.
pub struct JobScheduler {
    options: SchedulerOptions,
    /// Always [`Some`] except during [`Drop`].
    sender: Option<flume::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl JobScheduler {
    /// Validates `options` and starts the worker threads.
    pub fn new(options: SchedulerOptions) -> Result<Self, SchedulerError> {
        options.validate()?;

        let (sender, receiver) = match options.queue_capacity {
            Some(capacity) => flume::bounded(capacity),
            None => flume::unbounded(),
        };
        let mut workers = Vec::with_capacity(options.worker_count);
        for index in 0..options.worker_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("raytrace-{index}"))
                .spawn(move || worker_loop(index, &receiver))
                .map_err(SchedulerError::Spawn)?;
            workers.push(handle);
        }
        log::debug!(
            "started {} raytrace workers, {} slices per frame",
            options.worker_count,
            options.slice_count
        );

        Ok(Self {
            options,
            sender: Some(sender),
            workers,
        })
    }

    /// Returns the options this scheduler was created with.
    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Raytraces `scene` as seen by `camera` into every pixel of `image`, using the worker
    /// threads, and returns once all of it has been written.
    ///
    /// `camera` must have been [updated](Camera::update) since it last changed. If it was
    /// not, or its update failed, nothing is dispatched, `image` is left unchanged, and
    /// [`DispatchError::Camera`] is returned; the caller may keep showing the previous frame.
    ///
    /// Pixels whose rays cannot be computed, and bands whose job panicked, are filled with
    /// the scene's background and reported in the returned [`FrameInfo`] rather than as
    /// errors.
    pub fn dispatch_frame(
        &mut self,
        image: &mut Image,
        camera: &Camera,
        scene: &Scene,
    ) -> Result<FrameInfo, DispatchError> {
        let matrices = camera.matrices().map_err(DispatchError::Camera)?;
        let viewport = Viewport::new(image.width(), image.height());
        let scene = *scene;

        let jobs = partition_rows(viewport.width, viewport.height, self.options.slice_count)
            .into_iter()
            .map(|region| {
                let work: Work = Box::new(move || {
                    let mut pixels = vec![0; region.area()];
                    let info = trace_region(&mut pixels, region, viewport, &matrices, &scene);
                    (pixels, info)
                });
                (region, work)
            })
            .collect();
        self.run_frame(image, jobs, scene.background.fallback_color().to_packed())
    }

    /// Queues `jobs`, waits for all of them, and copies their output into `image`.
    ///
    /// The regions must be disjoint and within the image. If a job panics, its region is
    /// filled with `fallback_pixel`.
    fn run_frame(
        &mut self,
        image: &mut Image,
        jobs: Vec<(Region, Work)>,
        fallback_pixel: u32,
    ) -> Result<FrameInfo, DispatchError> {
        let start_time = Instant::now();
        let job_count = jobs.len();
        if let Some(capacity) = self.options.queue_capacity {
            if job_count > capacity {
                return Err(DispatchError::QueueCapacity {
                    requested: job_count,
                    capacity,
                });
            }
        }
        let sender = self.sender.as_ref().ok_or(DispatchError::WorkersGone)?;
        if let Some(capacity) = self.options.queue_capacity {
            // Only this thread sends, so the free space can only grow while we send.
            let queued = sender.len();
            if job_count > capacity.saturating_sub(queued) {
                return Err(DispatchError::Backlog { queued });
            }
        }

        // The barrier is counted up front, so no job can observe it before every job of
        // the frame is accounted for.
        let barrier = Arc::new(FrameBarrier::new(job_count));
        for (region, work) in jobs {
            let job = Job {
                region,
                work,
                fallback_pixel,
                barrier: barrier.clone(),
            };
            if let Err(error) = sender.try_send(job) {
                // Jobs already queued for this frame are skipped by the workers.
                barrier.abandon();
                return Err(match error {
                    flume::TrySendError::Full(_) => DispatchError::Backlog {
                        queued: sender.len(),
                    },
                    flume::TrySendError::Disconnected(_) => DispatchError::WorkersGone,
                });
            }
        }

        let completed = barrier
            .wait(self.options.frame_timeout)
            .map_err(|remaining| DispatchError::Timeout { remaining })?;

        let mut info = FrameInfo {
            jobs: job_count,
            ..FrameInfo::default()
        };
        for band in completed {
            let Band {
                region,
                pixels,
                region_info,
                failed,
            } = band;
            for (y, source_row) in region
                .rows()
                .zip(pixels.chunks_exact(region.width.max(1)))
            {
                image.row_range_mut(y..y + 1)[region.columns()].copy_from_slice(source_row);
            }
            info.pixels += region_info;
            if failed {
                info.failed_jobs += 1;
            }
        }
        if info.pixels.fallback_pixels > 0 {
            info.flaws |= Flaws::FALLBACK_PIXELS;
        }
        if info.failed_jobs > 0 {
            info.flaws |= Flaws::WORKER_FAILURE;
        }
        info.elapsed = start_time.elapsed();
        Ok(info)
    }
}

impl fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            options,
            sender,
            workers,
        } = self;
        f.debug_struct("JobScheduler")
            .field("options", options)
            .field("queued", &sender.as_ref().map(flume::Sender::len))
            .field("workers", &workers.len())
            .finish()
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        // Closing the channel makes each worker exit once the queue is drained.
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("raytrace worker thread panicked outside of a job");
            }
        }
    }
}

/// Information about one frame produced by [`JobScheduler::dispatch_frame()`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct FrameInfo {
    /// Number of jobs the frame was split into.
    pub jobs: usize,
    /// Totals over all traced pixels.
    pub pixels: RegionInfo,
    /// Number of jobs that panicked and whose band shows the background.
    pub failed_jobs: usize,
    /// Wall-clock time from dispatch until all jobs were done and copied.
    pub elapsed: Duration,
    /// Summary of the ways this frame is inaccurate.
    pub flaws: Flaws,
}

/// Error from [`JobScheduler::new()`].
#[derive(Debug, displaydoc::Display)]
#[non_exhaustive]
pub enum SchedulerError {
    /// invalid scheduler options: {0}
    InvalidOptions(&'static str),

    /// failed to start worker thread
    Spawn(std::io::Error),
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulerError::InvalidOptions(_) => None,
            SchedulerError::Spawn(e) => Some(e),
        }
    }
}

/// Error from [`JobScheduler::dispatch_frame()`].
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum DispatchError {
    /// camera is not ready for rendering
    Camera(CameraError),

    /// frame needs {requested} jobs but the job queue holds at most {capacity}
    QueueCapacity {
        /// Number of jobs the frame needed.
        requested: usize,
        /// Configured queue capacity.
        capacity: usize,
    },

    /// job queue still holds {queued} jobs from an earlier frame
    Backlog {
        /// Number of jobs in the queue when the frame was rejected.
        queued: usize,
    },

    /// frame timed out with {remaining} jobs unfinished
    Timeout {
        /// Number of jobs which had not completed.
        remaining: usize,
    },

    /// all raytrace workers have exited
    WorkersGone,
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Camera(e) => Some(e),
            DispatchError::QueueCapacity { .. }
            | DispatchError::Backlog { .. }
            | DispatchError::Timeout { .. }
            | DispatchError::WorkersGone => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The computation of one job: produces the region's pixels, row by row.
type Work = Box<dyn FnOnce() -> (Vec<u32>, RegionInfo) + Send>;

struct Job {
    region: Region,
    work: Work,
    fallback_pixel: u32,
    barrier: Arc<FrameBarrier>,
}

impl Job {
    fn run(self) {
        let Job {
            region,
            work,
            fallback_pixel,
            barrier,
        } = self;
        if barrier.is_abandoned() {
            log::trace!(
                "skipping raytrace job for rows {rows:?} of an abandoned frame",
                rows = region.rows()
            );
            return;
        }
        let band = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok((pixels, region_info)) if pixels.len() == region.area() => Band {
                region,
                pixels,
                region_info,
                failed: false,
            },
            Ok((pixels, _)) => {
                log::error!(
                    "raytrace job for rows {rows:?} produced {len} pixels instead of {area}",
                    rows = region.rows(),
                    len = pixels.len(),
                    area = region.area()
                );
                Band::failed(region, fallback_pixel)
            }
            Err(payload) => {
                log::error!(
                    "raytrace job for rows {rows:?} panicked: {message}",
                    rows = region.rows(),
                    message = panic_message(payload.as_ref())
                );
                Band::failed(region, fallback_pixel)
            }
        };
        barrier.complete(band);
    }
}

/// Output of a finished job.
struct Band {
    region: Region,
    pixels: Vec<u32>,
    region_info: RegionInfo,
    failed: bool,
}

impl Band {
    fn failed(region: Region, fallback_pixel: u32) -> Self {
        Band {
            region,
            pixels: vec![fallback_pixel; region.area()],
            region_info: RegionInfo {
                pixels: region.area(),
                fallback_pixels: region.area(),
            },
            failed: true,
        }
    }
}

/// Completion tracking for one frame's jobs.
struct FrameBarrier {
    state: Mutex<FrameState>,
    all_done: Condvar,
}

struct FrameState {
    remaining: usize,
    completed: Vec<Band>,
    /// Set once nobody will collect the output.
    abandoned: bool,
}

impl FrameBarrier {
    fn new(job_count: usize) -> Self {
        Self {
            state: Mutex::new(FrameState {
                remaining: job_count,
                completed: Vec::with_capacity(job_count),
                abandoned: false,
            }),
            all_done: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrameState> {
        // The lock is never held while running job code, so poisoning can only come from a
        // panic in this module's own bookkeeping, and the state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn abandon(&self) {
        let mut state = self.lock();
        state.abandoned = true;
        state.completed.clear();
    }

    fn is_abandoned(&self) -> bool {
        self.lock().abandoned
    }

    fn complete(&self, band: Band) {
        let mut state = self.lock();
        if state.abandoned {
            return;
        }
        state.completed.push(band);
        state.remaining -= 1;
        if state.remaining == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every job has completed, and returns their output.
    /// On timeout, abandons the frame and returns the number of jobs not yet completed.
    fn wait(&self, timeout: Option<Duration>) -> Result<Vec<Band>, usize> {
        let state = self.lock();
        let mut state = match timeout {
            None => self
                .all_done
                .wait_while(state, |s| s.remaining > 0)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                let (mut state, _) = self
                    .all_done
                    .wait_timeout_while(state, timeout, |s| s.remaining > 0)
                    .unwrap_or_else(PoisonError::into_inner);
                if state.remaining > 0 {
                    state.abandoned = true;
                    state.completed.clear();
                    return Err(state.remaining);
                }
                state
            }
        };
        Ok(mem::take(&mut state.completed))
    }
}

fn worker_loop(index: usize, receiver: &flume::Receiver<Job>) {
    log::trace!("raytrace worker {index} waiting for jobs");
    while let Ok(job) = receiver.recv() {
        job.run();
    }
    log::trace!("raytrace worker {index} exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "(non-string panic payload)"
    }
}
