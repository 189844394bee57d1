use image::{Rgb, RgbImage};
use std::path::Path;
use std::process::{Command, Output};

fn bgcut(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bgcut"))
        .args(args)
        // never open a real window
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("WAYLAND_SOCKET")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_image_argument_exits_with_one() {
    let output = bgcut(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--image"));
}

#[test]
fn unreadable_image_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");
    let output = bgcut(&["--image", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to load image"));
}

#[test]
fn help_exits_with_zero() {
    let output = bgcut(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--image"));
}

#[test]
fn oversized_brush_is_rejected() {
    let output = bgcut(&["--image", "whatever.png", "--brush-radius", "4000000000"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--brush-radius"));
}

fn write_image(path: &Path) {
    RgbImage::from_pixel(16, 16, Rgb([40, 80, 120]))
        .save(path)
        .unwrap();
}

#[test]
fn no_display_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.png");
    write_image(&path);

    let output = bgcut(&["--image", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).is_empty());
}
