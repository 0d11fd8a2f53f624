use std::{
    path::PathBuf,
    process::{Command, Output, Stdio},
};

use image::{Rgba, RgbaImage};

fn write_seed_image(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("mazm-{}-{name}.png", std::process::id()));
    let image = RgbaImage::from_fn(32, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    image.save(&path).expect("write seed image");
    path
}

fn run_mazm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mazm"))
        .args(args)
        .env("RUST_LOG", "info")
        .stdin(Stdio::null())
        .output()
        .expect("run mazm")
}

#[test]
fn frame_limit_stops_the_animation() {
    let image = write_seed_image("limit");
    let output = run_mazm(&[
        image.to_str().expect("utf-8 path"),
        "--width",
        "16",
        "--fps",
        "1000",
        "--max-frames",
        "5",
    ]);
    let _ = std::fs::remove_file(&image);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("\u{1b}[2J").count(), 5);
    assert!(String::from_utf8_lossy(&output.stderr).contains("frame limit reached"));
}

#[test]
fn finite_maze_runs_to_completion() {
    let image = write_seed_image("finite");
    let output = run_mazm(&[
        image.to_str().expect("utf-8 path"),
        "--width",
        "8",
        "--speed",
        "1000",
        "--fps",
        "1000",
    ]);
    let _ = std::fs::remove_file(&image);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("terminated after"));
}

#[test]
fn undecodable_images_are_skipped() {
    let output = run_mazm(&["does/not/exist.png"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does/not/exist.png"));
}

#[test]
fn zero_speed_flag_fails_fast() {
    let output = run_mazm(&["--speed", "0"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("speed must be a positive integer"));
}

#[test]
fn oversized_grid_flags_fail_before_decoding() {
    let output = run_mazm(&["missing.png", "--width", "60000", "--height", "60000"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds the limit"));
}
