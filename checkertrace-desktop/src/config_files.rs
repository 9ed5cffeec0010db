use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use checkertrace_render::raytracer::{Cylinder, Scene};
use checkertrace_render::scheduler::SchedulerOptions;

// -------------------------------------------------------------------------------------------------

/// Settings of the demo which are not command-line options.
///
/// Stored as JSON; fields absent from the file take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct DemoConfig {
    /// Output size when `--display-size` is `auto`. The rendered image is enlarged to
    /// this size.
    pub display_size: [usize; 2],
    /// Size of the raytraced image.
    pub render_size: [usize; 2],

    /// Number of raytracing worker threads.
    pub worker_count: usize,
    /// Number of row bands each frame is split into.
    pub slice_count: usize,
    /// Maximum number of queued raytracing jobs; unlimited if absent.
    pub queue_capacity: Option<usize>,
    /// Give up on a frame whose raytracing takes longer than this many milliseconds.
    pub frame_timeout_ms: Option<u64>,

    /// Length of the demo in seconds.
    pub demo_length: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    #[allow(missing_docs)]
    pub camera_mode: CameraModeSetting,
    #[allow(missing_docs)]
    pub scene: SceneSetting,

    /// Demo time in seconds after which the heavy blur starts.
    pub blur_start: f32,
    /// Number of repetitions of the heavy blur.
    pub blur_passes: usize,
    /// Maximum wobble displacement in pixels.
    pub wobble_amplitude: f32,
    /// Wobble displacement at the end of the demo, before clamping to
    /// [`Self::wobble_amplitude`]; the displacement grows linearly up to it.
    pub wobble_strength_scale: f32,

    /// Number of points in the sphere point cloud, used when no title image is given.
    pub sphere_points: usize,
    /// Minimum demo time between two recorded camera path lines, in milliseconds.
    pub camera_record_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            display_size: [600, 600],
            render_size: [256, 256],
            worker_count: 2,
            slice_count: 8,
            queue_capacity: None,
            frame_timeout_ms: None,
            demo_length: 135.0,
            fov_degrees: 90.0,
            camera_mode: CameraModeSetting::Orbit,
            scene: SceneSetting::Plane,
            blur_start: 10.0,
            blur_passes: 4,
            wobble_amplitude: 6.0,
            wobble_strength_scale: 10.0,
            sphere_points: 128,
            camera_record_interval_ms: 10,
        }
    }
}

impl DemoConfig {
    /// Options for the raytracing job scheduler.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        let mut options = SchedulerOptions::default();
        options.worker_count = self.worker_count;
        options.slice_count = self.slice_count;
        options.queue_capacity = self.queue_capacity;
        options.frame_timeout = self.frame_timeout_ms.map(Duration::from_millis);
        options
    }

    /// The scene to raytrace.
    pub fn scene(&self) -> Scene {
        match self.scene {
            SceneSetting::Plane => Scene::PLANE,
            SceneSetting::Cylinder {
                radius,
                cap_height,
            } => Scene {
                cylinder: Some(Cylinder { radius, cap_height }),
                ..Scene::PLANE
            },
        }
    }
}

/// How the camera moves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum CameraModeSetting {
    /// Circle around the origin, bobbing up and down.
    Orbit,
    /// Follow the camera path given by `--play-camera-path`, or stay still without one.
    Free,
}

/// Which objects are in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SceneSetting {
    /// The ground plane only.
    Plane,
    /// The ground plane and a vertical cylinder around the Y axis.
    Cylinder {
        #[allow(missing_docs)]
        radius: f32,
        #[allow(missing_docs)]
        cap_height: f32,
    },
}

// -------------------------------------------------------------------------------------------------

/// [`clap::Args`] argument group struct for args that affect what settings are used.
#[derive(Clone, Debug, clap::Args)]
pub struct SettingsArgs {
    /// Ignore all configuration files, using only defaults and command-line options.
    #[arg(long = "no-config-files", conflicts_with = "config_file")]
    pub(crate) no_config_files: bool,

    /// Configuration file to use instead of the one in the platform's configuration
    /// directory. It is created with default values if it does not exist.
    #[arg(long = "config", value_name = "FILE")]
    pub(crate) config_file: Option<PathBuf>,

    #[expect(clippy::doc_markdown, reason = "will be displayed in --help")]
    /// Override the value of a setting for this session, instead of taking it from files
    /// or defaults.
    ///
    /// The value is specified as a key-value pair where the key is an unquoted string, the
    /// separator is “=”, and the value is a JSON value (which, if a string, must be quoted);
    /// for example: -Scamera_mode='"free"'
    #[arg(long = "set", short = 'S', value_parser = parse_configure, value_name="NAME=JSON")]
    pub(crate) set: Vec<(String, serde_json::Value)>,
}

impl SettingsArgs {
    /// Constructs the [`DemoConfig`] a session with these args should use.
    pub fn build_config(self) -> Result<DemoConfig, anyhow::Error> {
        let Self {
            no_config_files,
            config_file,
            set: to_override,
        } = self;

        let mut config = if no_config_files {
            DemoConfig::default()
        } else {
            let path = match config_file {
                Some(path) => path,
                None => default_config_path().context("Error loading configuration files")?,
            };
            read_or_create_default_json_file("demo configuration", &path, DemoConfig::default)
        };

        if !to_override.is_empty() {
            let Ok(serde_json::Value::Object(mut current)) = serde_json::to_value(&config) else {
                anyhow::bail!("configuration did not serialize as a JSON object");
            };
            for (key, value) in to_override {
                current.insert(key, value);
            }
            config = serde_json::from_value(serde_json::Value::Object(current))
                .context("--set did not produce a valid configuration")?;
        }

        Ok(config)
    }
}

fn parse_configure(arg: &str) -> Result<(String, serde_json::Value), anyhow::Error> {
    let (key, value) = arg.split_once('=').ok_or_else(|| anyhow::anyhow!("missing '='"))?;
    let value = serde_json::from_str(value)?;
    Ok((key.to_owned(), value))
}

/// Path of the configuration file in the platform-appropriate configuration directory,
/// which is created if necessary.
fn default_config_path() -> Result<PathBuf, anyhow::Error> {
    if std::env::var("CHECKERTRACE_DO_NOT_USE_CONFIG_FILES_IN_TESTS").is_ok() {
        anyhow::bail!(
            "tests should be hermetic and not touch user config files \
            (environment variable CHECKERTRACE_DO_NOT_USE_CONFIG_FILES_IN_TESTS set, \
            but --no-config-files not passed)"
        );
    }

    let project_dirs = ProjectDirs::from("org.checkertrace", "", "checkertrace")
        .ok_or_else(|| anyhow::anyhow!("could not find configuration directory"))?;
    fs::create_dir_all(project_dirs.config_dir())?;
    Ok(project_dirs.config_dir().join("config.json"))
}

// -------------------------------------------------------------------------------------------------

fn read_or_create_default_json_file<V: DeserializeOwned + Serialize>(
    description: &str,
    path: &Path,
    default: fn() -> V,
) -> V {
    match File::open(path) {
        Ok(file) => match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => {
                log::debug!(
                    "Loaded {description} from {path}",
                    path = path.to_string_lossy()
                );
                value
            }
            Err(e) => {
                log::warn!(
                    "Syntax error in {description} loaded from {path}; \
                    using default values. Error: {e}",
                    path = path.to_string_lossy(),
                );
                default()
            }
        },
        Err(open_for_read_error) if open_for_read_error.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No {description} file found; creating {path}",
                path = path.to_string_lossy()
            );
            let value = default();
            let write_result = serde_json::to_string_pretty(&value)
                .map_err(std::io::Error::from)
                .and_then(|json_text| fs::write(path, json_text.as_bytes()));
            match write_result {
                Ok(()) => log::trace!(
                    "Wrote default {description} to {path}",
                    path = path.to_string_lossy()
                ),
                Err(write_error) => {
                    log::error!(
                        "Error while writing default {description} file {path}: {write_error}",
                        path = path.to_string_lossy(),
                    );
                }
            }
            value
        }
        Err(e) => {
            log::error!(
                "Error while reading {description} file {path}: {e}",
                path = path.to_string_lossy(),
            );
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(no_config_files: bool, config_file: Option<PathBuf>) -> SettingsArgs {
        SettingsArgs {
            no_config_files,
            config_file,
            set: Vec::new(),
        }
    }

    #[test]
    fn defaults_without_files() {
        assert_eq!(
            args(true, None).build_config().unwrap(),
            DemoConfig::default()
        );
    }

    #[test]
    fn override_with_set() {
        let mut args = args(true, None);
        args.set = vec![
            parse_configure("worker_count=4").unwrap(),
            parse_configure(r#"camera_mode="free""#).unwrap(),
            parse_configure(r#"scene={"cylinder":{"radius":1.5,"cap_height":2}}"#).unwrap(),
        ];
        let config = args.build_config().unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.camera_mode, CameraModeSetting::Free);
        assert_eq!(
            config.scene().cylinder,
            Some(Cylinder {
                radius: 1.5,
                cap_height: 2.0
            })
        );
        assert_eq!(config.scheduler_options().worker_count, 4);
    }

    #[test]
    fn set_rejects_unknown_keys() {
        let mut args = args(true, None);
        args.set = vec![parse_configure("no_such_setting=1").unwrap()];
        let error = args.build_config().unwrap_err();
        assert!(
            format!("{error:#}").contains("--set did not produce a valid configuration"),
            "{error:#}"
        );
    }

    #[test]
    fn parse_configure_errors() {
        assert!(parse_configure("foo").is_err());
        assert!(parse_configure("foo=bar").is_err()); // not JSON
        assert_eq!(
            parse_configure("foo=\"bar\"").unwrap(),
            ("foo".to_owned(), serde_json::json!("bar"))
        );
    }

    #[test]
    fn config_file_created_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = args(false, Some(path.clone())).build_config().unwrap();
        assert_eq!(created, DemoConfig::default());
        assert!(path.exists());

        fs::write(&path, r#"{ "slice_count": 3, "blur_passes": 0 }"#).unwrap();
        let read = args(false, Some(path.clone())).build_config().unwrap();
        assert_eq!(read.slice_count, 3);
        assert_eq!(read.blur_passes, 0);
        assert_eq!(read.worker_count, DemoConfig::default().worker_count);
    }

    #[test]
    fn config_file_syntax_error_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(
            args(false, Some(path)).build_config().unwrap(),
            DemoConfig::default()
        );
    }
}
