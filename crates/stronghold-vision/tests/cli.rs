#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn write_frame(path: &Path, octagon: bool) {
    let mut img = image::RgbImage::new(320, 180);
    if octagon {
        for y in 50..=130i32 {
            for x in 120..=200i32 {
                if (x - 160).abs() + (y - 90).abs() <= 56 {
                    img.put_pixel(x as u32, y as u32, image::Rgb([255, 255, 255]));
                }
            }
        }
    }
    img.save(path).unwrap();
}

#[test]
fn run_prints_one_hex_payload_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let hit = dir.path().join("hit.png");
    let miss = dir.path().join("miss.png");
    write_frame(&hit, true);
    write_frame(&miss, false);

    Command::cargo_bin("stronghold-vision")
        .unwrap()
        .args(["run", "--telemetry", "0102030405060708"])
        .arg(&hit)
        .arg(&miss)
        .assert()
        .success()
        .stdout(predicate::eq(
            "00000001000000a00000005a0102030405060708\n\
             0000000100000000000000000102030405060708\n",
        ));
}

#[test]
fn run_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg.json");
    std::fs::write(&cfg, r#"{"target": "ball"}"#).unwrap();
    let frame = dir.path().join("empty.png");
    write_frame(&frame, false);

    Command::cargo_bin("stronghold-vision")
        .unwrap()
        .arg("run")
        .arg("--config")
        .arg(&cfg)
        .arg(&frame)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("00000002"))
        .stdout(predicate::function(|s: &str| s.trim().len() == 48));
}

#[test]
fn bad_telemetry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let frame = dir.path().join("f.png");
    write_frame(&frame, false);

    Command::cargo_bin("stronghold-vision")
        .unwrap()
        .args(["run", "--telemetry", "0102"])
        .arg(&frame)
        .assert()
        .failure()
        .stderr(predicate::str::contains("telemetry must be 8 bytes"));
}

#[test]
fn print_config_emits_defaults() {
    Command::cargo_bin("stronghold-vision")
        .unwrap()
        .args(["print-config", "--target", "ball"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"target\": \"ball\""))
        .stdout(predicate::str::contains("\"value_floor\": 110"));
}

#[test]
fn decode_splits_payload() {
    Command::cargo_bin("stronghold-vision")
        .unwrap()
        .args([
            "decode",
            "--target",
            "tower",
            "00000001000000a00000005a0102030405060708",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("values:    [1, 160, 90]"))
        .stdout(predicate::str::contains("telemetry: 0102030405060708"));
}
