use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;

#[test]
fn prints_one_value_per_selection() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("5 steps:2").arg("-n").arg("3");
    cmd.assert().success().stdout("5\n7\n9\n");
}

#[test]
fn selections_feed_text_sequences() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("! ~.>4").args(["-s", "a", "-s", "bc"]);
    cmd.assert().success().stdout("...a\n..bc\n");
}

#[test]
fn reads_selections_from_stdin() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("|'o * 2'").arg("--stdin").write_stdin("1\n2\n3\n");
    cmd.assert().success().stdout("2\n4\n6\n");
}

#[test]
fn stop_expression_is_capped_by_max() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("1 @false").args(["--max", "4"]);
    cmd.assert().success().stdout("1\n2\n3\n4\n");
}

#[test]
fn settings_overrides_apply() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("").args(["-n", "2", "--set", "number_format=03d", "--set", "start=7"]);
    cmd.assert().success().stdout("007\n008\n");
}

#[test]
fn config_file_supplies_lists() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(file, "mysequences = [[\"red\", \"green\", \"blue\"]]").expect("write config");

    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg(";green").arg("-n").arg("3").arg("--config").arg(file.path());
    cmd.assert().success().stdout("green\nblue\nred\n");
}

#[test]
fn json_output_reports_kind_and_values() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("a").args(["-n", "2", "--json"]);
    cmd.assert().success().stdout(
        predicate::str::contains("\"kind\": \"Alpha\"")
            .and(predicate::str::contains("\"values\""))
            .and(predicate::str::contains("\"b\"")),
    );
}

#[test]
fn broken_alphabet_fails() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("abc").args(["--set", "alphabet=aab"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("duplicate character"));
}

#[test]
fn malformed_override_fails() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("1").args(["--set", "start"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.arg("1").args(["--config", "/definitely/not/here.toml"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn verbose_logs_debug_lines_to_stderr() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.env_remove("RUST_LOG").arg("1").arg("-v");
    cmd.assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn quiet_run_keeps_stderr_empty() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.env_remove("RUST_LOG").arg("1");
    cmd.assert().success().stderr(predicate::str::is_empty());
}

#[test]
fn failing_expression_warns_on_stderr() {
    let mut cmd = cargo_bin_cmd!("insertseq");
    cmd.env_remove("RUST_LOG").arg("1 ::missing");
    cmd.assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("WARN"));
}
