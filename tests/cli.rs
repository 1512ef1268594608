use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::predicate;

fn demo(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
}

#[test]
fn demo_run_writes_result_files() -> Result<(), Box<dyn std::error::Error>> {
    let out = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("railsim")?;
    cmd.arg(demo("network.txt"))
        .arg(demo("trains.txt"))
        .arg("--output-dir")
        .arg(out.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("TrainAB: scheduled 14h10, arrived"))
        .stdout(predicate::str::contains("All trains arrived"));

    let result = std::fs::read_to_string(out.path().join("TrainAB_14h10.result"))?;
    assert!(result.starts_with("Train: TrainAB\nFinal travel time: "));
    assert!(result.contains("[CityA     ][RailNodeA ]"));
    assert!(out.path().join("TrainCD_15h30.result").exists());
    Ok(())
}

#[test]
fn config_file_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let out = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("railsim")?;
    cmd.arg(demo("network.txt"))
        .arg(demo("trains.txt"))
        .args(["--config", demo("config.json").to_str().unwrap_or_default()])
        .arg("-o")
        .arg(out.path());
    cmd.assert().success();
    Ok(())
}

#[test]
fn missing_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let out = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("railsim")?;
    cmd.arg(out.path().join("nope.txt"))
        .arg(demo("trains.txt"))
        .arg("-o")
        .arg(out.path());
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
    Ok(())
}

#[test]
fn malformed_network_reports_line() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let network = dir.path().join("network.txt");
    std::fs::write(&network, "Node CityA\nNode CityB\nRail CityA CityB 0 100\n")?;
    let mut cmd = Command::cargo_bin("railsim")?;
    cmd.arg(&network)
        .arg(demo("trains.txt"))
        .arg("-o")
        .arg(dir.path());
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 3"));
    Ok(())
}

#[test]
fn unreachable_destination_stops_at_ceiling() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let network = dir.path().join("network.txt");
    let trains = dir.path().join("trains.txt");
    std::fs::write(&network, "Node CityA\nNode CityB\nNode Island\nRail CityA CityB 10 100\n")?;
    std::fs::write(&trains, "Lost 80 0.05 300 40 CityA Island 08h00 00h00\n")?;
    let mut cmd = Command::cargo_bin("railsim")?;
    cmd.arg(&network)
        .arg(&trains)
        .args(["--max-steps", "5", "-o"])
        .arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Lost: destination unreachable"))
        .stdout(predicate::str::contains("Stopped after 5 steps"));
    assert!(dir.path().join("Lost_08h00.result").exists());
    Ok(())
}
