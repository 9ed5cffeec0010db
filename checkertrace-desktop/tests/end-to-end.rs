//! Run the `checkertrace` binary and check its output files.

use std::path::Path;
use std::process;

use checkertrace_desktop::camera_path::CameraPath;
use checkertrace_desktop::image_file::load_png;

fn run(args: &[&str], output_dir: &Path) -> process::Output {
    let output = process::Command::new(env!("CARGO_BIN_EXE_checkertrace"))
        .env("CHECKERTRACE_DO_NOT_USE_CONFIG_FILES_IN_TESTS", "1")
        .current_dir(output_dir)
        .arg("--no-config-files")
        .arg("--simplify-log-format")
        .args(["-S", "render_size=[32,32]"])
        .args(args)
        .output()
        .expect("Failed to start checkertrace process");
    print_output(&output);
    output
}

fn print_output(output: &process::Output) {
    println!(
        "[command stderr]\n{stderr}\n[command stdout]\n{stdout}\n[end of output]",
        stderr = String::from_utf8_lossy(&output.stderr),
        stdout = String::from_utf8_lossy(&output.stdout),
    );
}

#[test]
fn record_still_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = run(
        &["--graphics=record", "-o", "out.png", "--display-size", "64x48"],
        temp_dir.path(),
    );
    assert!(output.status.success());

    let image = load_png(&temp_dir.path().join("out.png")).unwrap();
    assert_eq!((image.width(), image.height()), (64, 48));
}

#[test]
fn record_animation_and_camera_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = run(
        &[
            "--graphics=record",
            "-o",
            "anim.png",
            "--display-size=32x32",
            "--duration=0.1",
            "--fps=30",
            "--record-camera-path=camera.txt",
        ],
        temp_dir.path(),
    );
    assert!(output.status.success());

    let file = std::fs::File::open(temp_dir.path().join("anim.png")).unwrap();
    let reader = png::Decoder::new(file).read_info().unwrap();
    assert_eq!(reader.info().animation_control.unwrap().num_frames, 3);

    // The camera moves 1/30 s per frame, above the 10 ms recording interval.
    let path = CameraPath::load(&temp_dir.path().join("camera.txt")).unwrap();
    assert_eq!(path.len(), 2);
}

#[test]
fn headless_with_camera_playback() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("camera.txt"),
        " 1 0 0 0 0 1 0 -1 0 0 1 0 0 0 0 1\n",
    )
    .unwrap();
    let output = run(
        &[
            "--play-camera-path=camera.txt",
            "--duration=0.05",
            "-S",
            "sphere_points=10",
        ],
        temp_dir.path(),
    );
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rendered 3 frames"), "{stderr}");
}

#[test]
fn record_without_output_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = run(&["--graphics=record"], temp_dir.path());
    assert!(!output.status.success());
}

#[test]
fn missing_title_image_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = run(&["--title-image=nonexistent.png"], temp_dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load title image"), "{stderr}");
}
