//! Recording and playback of camera movement.
//!
//! A camera path file is text with one line per recorded frame, each line holding the 16
//! elements of a view matrix in row-major order, separated by whitespace.

use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use checkertrace_render::math::Matrix4x4f;

/// Number of path frames per second of playback time.
pub const PLAYBACK_RATE: f32 = 10.0;

/// A sequence of camera view matrices, played back at [`PLAYBACK_RATE`] frames per second.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraPath {
    frames: Vec<Matrix4x4f>,
}

impl CameraPath {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame.
    pub fn add(&mut self, view: Matrix4x4f) {
        self.frames.push(view);
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[allow(missing_docs)]
    pub fn frames(&self) -> &[Matrix4x4f] {
        &self.frames
    }

    /// Returns the view matrix for playback time `t` in seconds.
    ///
    /// Times before the start give the first frame and times after the end give the last
    /// frame. Returns [`None`] only if the path is empty.
    pub fn get(&self, t: f32) -> Option<Matrix4x4f> {
        let last = self.frames.len().checked_sub(1)?;
        let index = (t * PLAYBACK_RATE).floor();
        // Negative and NaN times both fail this comparison.
        let index = if index >= 0.0 { index as usize } else { 0 };
        Some(self.frames[index.min(last)])
    }

    /// Reads frames from `reader` until the end, or until a line that does not contain
    /// 16 numbers.
    pub fn read_from(reader: impl BufRead) -> io::Result<Self> {
        let mut path = Self::new();
        for line in reader.lines() {
            match parse_line(&line?) {
                Some(view) => path.add(view),
                None => break,
            }
        }
        Ok(path)
    }

    /// Writes all frames to `writer`.
    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        for view in &self.frames {
            writer.write_all(format_line(view).as_bytes())?;
        }
        writer.flush()
    }

    /// Reads a camera path file.
    pub fn load(path: &Path) -> Result<Self, CameraPathError> {
        File::open(path)
            .and_then(|file| Self::read_from(BufReader::new(file)))
            .map_err(|error| CameraPathError::new(path, error))
    }

    /// Writes a camera path file, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), CameraPathError> {
        File::create(path)
            .and_then(|file| self.write_to(BufWriter::new(file)))
            .map_err(|error| CameraPathError::new(path, error))
    }
}

/// Appends the camera's view matrix to a camera path file as the demo runs.
#[derive(Debug)]
pub struct CameraPathRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    interval: Duration,
    last_recorded: Option<Duration>,
    frames_written: usize,
}

impl CameraPathRecorder {
    /// Creates (or truncates) the file at `path`.
    ///
    /// Lines will be written no more often than once per `interval` of demo time.
    pub fn create(path: &Path, interval: Duration) -> Result<Self, CameraPathError> {
        let file = File::create(path).map_err(|error| CameraPathError::new(path, error))?;
        Ok(Self {
            path: path.to_owned(),
            writer: BufWriter::new(file),
            interval,
            last_recorded: None,
            frames_written: 0,
        })
    }

    /// Appends `view` to the file if at least the recording interval has passed since the
    /// previously recorded frame. Returns whether a line was written.
    ///
    /// The line is flushed immediately, so the file is usable even if the program does
    /// not exit cleanly.
    pub fn record(
        &mut self,
        demo_time: Duration,
        view: &Matrix4x4f,
    ) -> Result<bool, CameraPathError> {
        if self
            .last_recorded
            .is_some_and(|last| demo_time.saturating_sub(last) < self.interval)
        {
            return Ok(false);
        }
        self.writer
            .write_all(format_line(view).as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|error| CameraPathError::new(&self.path, error))?;
        self.last_recorded = Some(demo_time);
        self.frames_written += 1;
        Ok(true)
    }

    /// Number of lines written so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

fn parse_line(line: &str) -> Option<Matrix4x4f> {
    let mut elements = [0.0; 16];
    let mut tokens = line.split_whitespace();
    for element in &mut elements {
        *element = tokens.next()?.parse().ok()?;
    }
    Some(Matrix4x4f::from_row_major(elements))
}

fn format_line(view: &Matrix4x4f) -> String {
    let mut line = String::new();
    for element in view.as_slice() {
        // `Display` for floats prints the shortest text that parses back to the same value.
        let _ = write!(line, " {element}");
    }
    line.push('\n');
    line
}

/// Error reading or writing a camera path file.
#[derive(Debug)]
pub struct CameraPathError {
    path: PathBuf,
    source: io::Error,
}

impl CameraPathError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_owned(),
            source,
        }
    }
}

impl fmt::Display for CameraPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to access camera path file {}",
            self.path.display()
        )
    }
}

impl std::error::Error for CameraPathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
