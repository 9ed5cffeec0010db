//! Command line option parsing.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use checkertrace_desktop::DemoConfig;
use checkertrace_desktop::SettingsArgs;
use checkertrace_desktop::logging::LoggingArgs;
use checkertrace_desktop::record::{RecordAnimationOptions, RecordOptions};

#[derive(Clone, Debug, Parser)]
#[command(
    name = checkertrace_desktop::TITLE, author, about, version,
    help_template = "\
{name} {version}
{author}
{about-with-newline}
{usage-heading}
    {usage}

{all-args}{after-help}",
)]
pub(crate) struct DemoArgs {
    #[arg(
        long = "graphics",
        short = 'g',
        default_value = "headless",
        value_name = "mode",
        hide_possible_values = true,
        help = "Output mode",
        long_help = &**GRAPHICS_HELP_LONG,
    )]
    pub(crate) graphics: GraphicsType,

    /// Size of recorded images. If “auto”, the display size from the configuration is
    /// used.
    #[arg(long = "display-size", value_name = "W×H", default_value = "auto")]
    pub(crate) display_size: DisplaySizeArg,

    /// Length of demo time to run.
    ///
    /// * In 'record' mode, sets duration of the animation (or still image if absent).
    /// * In 'headless' mode, sets how many frames to render (one if absent).
    #[arg(long = "duration", value_name = "SECONDS", verbatim_doc_comment)]
    pub(crate) duration: Option<f64>,

    /// Frames per second of demo time.
    #[arg(long = "fps", value_name = "FPS", default_value_t = 60.0)]
    pub(crate) fps: f64,

    /// Output file name for 'record' mode.
    ///
    /// A single frame is written as a PNG image; more than one frame as an animated PNG.
    #[arg(
        long = "output",
        short = 'o',
        required_if_eq("graphics", "record"),
        value_name = "FILE"
    )]
    pub(crate) output_file: Option<PathBuf>,

    /// Move the camera along a path previously saved with --record-camera-path.
    #[arg(long = "play-camera-path", value_name = "FILE")]
    pub(crate) play_camera_path: Option<PathBuf>,

    /// Save the camera's movement to a file, one view matrix per line.
    #[arg(long = "record-camera-path", value_name = "FILE")]
    pub(crate) record_camera_path: Option<PathBuf>,

    /// PNG image to show as a point cloud. If absent, a sphere of points is shown.
    #[arg(long = "title-image", value_name = "FILE")]
    pub(crate) title_image: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) logging: LoggingArgs,

    #[command(flatten)]
    pub(crate) settings: SettingsArgs,
}

impl DemoArgs {
    /// Frame timing implied by `--duration` and `--fps`, or [`None`] for a single frame.
    pub(crate) fn animation_options(&self) -> Result<Option<RecordAnimationOptions>, anyhow::Error> {
        match self.duration {
            Some(seconds) => {
                let duration = Duration::try_from_secs_f64(seconds)
                    .map_err(|_| anyhow::anyhow!("--duration must be a non-negative number"))?;
                Ok(Some(RecordAnimationOptions::for_duration(duration, self.fps)?))
            }
            None => Ok(None),
        }
    }

    /// Construct [`RecordOptions`].
    ///
    /// Returns `Ok(None)` if recording was not requested (`output_file` not set).
    pub(crate) fn record_options(
        &self,
        config: &DemoConfig,
    ) -> Result<Option<RecordOptions>, anyhow::Error> {
        let Some(output_path) = self.output_file.clone() else {
            return Ok(None);
        };
        Ok(Some(RecordOptions::new(
            output_path,
            self.display_size.0.unwrap_or(config.display_size),
            self.animation_options()?,
        )))
    }
}

/// clap doesn't automatically compile the possible value help
/// (<https://github.com/clap-rs/clap/issues/3312>), so do it ourselves.
/// This is in a static so that it can become an `&'static str`.
static GRAPHICS_HELP_LONG: LazyLock<String> = LazyLock::new(|| {
    let pv_iter = GraphicsType::value_variants()
        .iter()
        .filter_map(|v| v.to_possible_value())
        .filter(|pv| !pv.is_hide_set());

    let max_width = pv_iter
        .clone()
        .map(|pv| pv.get_name().len())
        .max()
        .unwrap_or(0);

    let mut text = String::from("Output mode; one of the following keywords:\n");
    for pv in pv_iter {
        let _ = write!(
            text,
            "\n* {:max_width$} — {}",
            pv.get_name(),
            pv.get_help().unwrap_or_default()
        );
    }
    text
});

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
#[non_exhaustive]
pub(crate) enum GraphicsType {
    #[value(help = "Render frames without saving them, and report timing")]
    Headless,

    #[value(help = "Save frames to a PNG or animated PNG file")]
    Record,
}

/// Image size, parseable in a variety of formats, and with `None` referring to
/// “automatic”, not “optional”.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DisplaySizeArg(pub Option<[usize; 2]>);

impl FromStr for DisplaySizeArg {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(DisplaySizeArg(None))
        } else {
            let dims: [usize; 2] = s
                .split(&['×', 'x', ',', ';', ' '][..])
                .map(|s| {
                    s.parse::<usize>()
                        .map_err(|_| format!("{s:?} not an integer or \"auto\""))
                })
                .collect::<Result<Vec<usize>, String>>()?
                .try_into()
                .map_err(|_| String::from("must be two integers or \"auto\""))?;
            Ok(DisplaySizeArg(Some(dims)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> clap::error::Result<DemoArgs> {
        DemoArgs::try_parse_from(std::iter::once("checkertrace").chain(args.iter().copied()))
    }

    #[test]
    fn headless_is_default() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.graphics, GraphicsType::Headless);
        assert_eq!(args.display_size.0, None);
        assert!(args.animation_options().unwrap().is_none());
    }

    #[test]
    fn record_options_image() {
        let config = DemoConfig::default();
        let options = parse(&["-g", "record", "-o", "output.png"])
            .unwrap()
            .record_options(&config)
            .unwrap()
            .unwrap();
        assert_eq!(options.output_path, PathBuf::from("output.png"));
        assert_eq!(options.image_size, [600, 600]);
        assert_eq!(options.animation, None);
    }

    #[test]
    fn record_options_animation() {
        let options = parse(&[
            "-g",
            "record",
            "-o",
            "fancy.png",
            "--duration",
            "3",
            "--display-size",
            "320x200",
        ])
        .unwrap()
        .record_options(&DemoConfig::default())
        .unwrap()
        .unwrap();
        assert_eq!(options.image_size, [320, 200]);
        let animation = options.animation.unwrap();
        assert_eq!(animation.frame_count, 180);
        assert_eq!(animation.frame_period, Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn record_options_fps() {
        let animation = parse(&["--duration", "2", "--fps", "25"])
            .unwrap()
            .animation_options()
            .unwrap()
            .unwrap();
        assert_eq!(animation.frame_count, 50);
        assert_eq!(animation.frame_period, Duration::from_millis(40));
    }

    #[test]
    fn record_options_missing_file() {
        let e = parse(&["-g", "record"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn record_options_invalid_duration() {
        let e = parse(&["-g", "record", "-o", "o.png", "--duration", "X"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ValueValidation);

        let args = parse(&["--duration", "NaN"]).unwrap();
        assert!(args.animation_options().is_err());
        let args = parse(&["--duration", "1", "--fps", "0"]).unwrap();
        assert!(args.animation_options().is_err());
    }

    #[test]
    fn unknown_graphics_mode() {
        let e = parse(&["-g", "window"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn config_files_and_config_conflict() {
        let e = parse(&["--no-config-files", "--config", "c.json"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn display_size_parse() {
        let parse = |s: &str| s.parse::<DisplaySizeArg>().map(|DisplaySizeArg(size)| size);
        let err = |s: &str| Err(s.to_owned());
        assert_eq!(parse("auto"), Ok(None));
        assert_eq!(parse("1,2"), Ok(Some([1, 2])));
        assert_eq!(parse("30x93"), Ok(Some([30, 93])));
        assert_eq!(parse("30×93"), Ok(Some([30, 93])));
        assert_eq!(parse("30;93"), Ok(Some([30, 93])));
        assert_eq!(parse(""), err("\"\" not an integer or \"auto\""));
        assert_eq!(parse("1"), err("must be two integers or \"auto\""));
        assert_eq!(parse("a"), err("\"a\" not an integer or \"auto\""));
        assert_eq!(parse("1×1×1"), err("must be two integers or \"auto\""));
        assert_eq!(parse("1×b"), err("\"b\" not an integer or \"auto\""));
    }
}
