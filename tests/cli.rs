// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn mandelzoom() -> Command {
    Command::cargo_bin("mandelzoom").unwrap()
}

#[test]
fn writes_one_file_per_frame() {
    let dir = tempdir().unwrap();
    mandelzoom()
        .arg("--output")
        .arg(dir.path())
        .args(&["--size", "8", "--frames", "3", "--iterations", "50", "--threads", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 frames"));

    for name in &["frame00.txt", "frame01.txt", "frame02.txt"] {
        let text = fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(text.lines().count(), 64);
    }
    assert!(!dir.path().join("frame03.txt").exists());
}

#[test]
fn records_carry_three_fields() {
    let dir = tempdir().unwrap();
    mandelzoom()
        .arg("--output")
        .arg(dir.path())
        .args(&["--size", "4", "--frames", "1", "--span", "8", "--center=0,0"])
        .args(&["--iterations", "10"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("frame00.txt")).unwrap();
    let mut seen_origin = false;
    for line in text.lines() {
        let fields: Vec<&str> = line.split(", ").collect();
        assert_eq!(fields.len(), 3);
        let re: f64 = fields[0].parse().unwrap();
        let im: f64 = fields[1].parse().unwrap();
        let iterations: i64 = fields[2].parse().unwrap();
        if re == 0.0 && im == 0.0 {
            assert_eq!(iterations, -1);
            seen_origin = true;
        }
        if re == 2.0 && im == 2.0 {
            assert_eq!(iterations, 1);
        }
    }
    assert!(seen_origin);
}

#[test]
fn bounded_queues_are_accepted() {
    let dir = tempdir().unwrap();
    mandelzoom()
        .arg("--output")
        .arg(dir.path())
        .args(&["--size", "6", "--frames", "2", "--queue-depth", "1", "--threads", "3"])
        .assert()
        .success();
    assert!(dir.path().join("frame01.txt").exists());
}

#[test]
fn rejects_bad_thread_count() {
    let dir = tempdir().unwrap();
    mandelzoom()
        .arg("--output")
        .arg(dir.path())
        .args(&["--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Thread count must be between 1"));
}

#[test]
fn rejects_bad_centre() {
    let dir = tempdir().unwrap();
    mandelzoom()
        .arg("--output")
        .arg(dir.path())
        .args(&["--center", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse centre point"));
}

#[test]
fn requires_an_output_directory() {
    mandelzoom().assert().failure();
}
