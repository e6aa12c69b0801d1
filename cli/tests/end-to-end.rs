/// This is a set of tests which is ran against the built `geogrid` binary, using the grid and
/// tweet files in `tests/data`.
use std::env;
use std::path::PathBuf;
use std::process::{Command, Output};

const CLI_BIN_NAME: &str = "geogrid";

const EXPECTED_REPORT: &str = "TASK - 1
A1: 3 posts
B2: 3 posts
TASK - 2
A1: [('#afl', 2), ('#edge', 1), ('#melbourne', 1)]
B2: [('#melbourne', 2), ('#weather', 2)]
";

fn get_bin_path() -> PathBuf {
    let mut path = env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(CLI_BIN_NAME);
    path
}

fn data_path(file_name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(file_name);
    path.to_string_lossy().into_owned()
}

fn run_with(args: &[&str]) -> Output {
    Command::new(get_bin_path())
        .arg("--tweets")
        .arg(data_path("tweets.json"))
        .arg("--grid")
        .arg(data_path("grid.json"))
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

#[test]
fn missing_arguments() {
    let output = Command::new(get_bin_path()).output().unwrap();
    let output_str = String::from_utf8(output.stderr).unwrap();

    assert!(!output.status.success());
    assert!(output_str.contains("--tweets <tweets>"));
    assert!(output_str.contains("--grid <grid>"));
}

#[test]
fn single_worker_report() {
    let output = run_with(&["--workers", "1"]);

    assert!(output.status.success());
    assert_eq!(EXPECTED_REPORT, String::from_utf8(output.stdout).unwrap());
}

#[test]
fn worker_count_does_not_change_report() {
    for workers in &["2", "3", "4", "9"] {
        let output = run_with(&["--workers", *workers]);

        assert!(output.status.success());
        assert_eq!(EXPECTED_REPORT, String::from_utf8(output.stdout).unwrap());
    }
}

#[test]
fn text_hashtags_match_entity_hashtags() {
    let output = run_with(&["--workers", "2", "--hashtag-source", "text"]);

    assert!(output.status.success());
    assert_eq!(EXPECTED_REPORT, String::from_utf8(output.stdout).unwrap());
}

#[test]
fn top_one_keeps_ties() {
    let output = run_with(&["--top", "1"]);
    let expected = "TASK - 1
A1: 3 posts
B2: 3 posts
TASK - 2
A1: [('#afl', 2)]
B2: [('#melbourne', 2), ('#weather', 2)]
";

    assert!(output.status.success());
    assert_eq!(expected, String::from_utf8(output.stdout).unwrap());
}

#[test]
fn json_report() {
    let output = run_with(&["--json", "--workers", "3"]);
    let output_str = String::from_utf8(output.stdout).unwrap();

    assert!(output.status.success());
    assert!(output_str.contains("\"cell_id\": \"A1\""));
    assert!(output_str.contains("\"post_count\": 3"));
}

#[test]
fn missing_grid_file() {
    let output = Command::new(get_bin_path())
        .arg("--tweets")
        .arg(data_path("tweets.json"))
        .arg("--grid")
        .arg(data_path("missing.json"))
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    let output_str = String::from_utf8(output.stderr).unwrap();

    assert!(!output.status.success());
    assert!(output_str.contains("Error opening grid file"));
}

#[test]
fn zero_workers_rejected() {
    let output = run_with(&["--workers", "0"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
