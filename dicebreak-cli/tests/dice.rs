// Copyright (c) 2022, Mangekyou Network, Inc.
// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use dicebreak_cli::dice_cli_test_vectors::{GAME, KNOWN_BLOCK, TEST_VECTORS};
use predicates::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn integration_test_dice_roll() {
    for vector in TEST_VECTORS {
        let expected = format!("Digest: {}\nRoll:   {}\n", vector.digest, vector.roll);
        let output = Command::new(env!("CARGO_BIN_EXE_dice-cli"))
            .arg("roll")
            .arg("--block-hash")
            .arg(vector.block_hash)
            .arg("--game")
            .arg(GAME)
            .arg("--nonce")
            .arg(vector.nonce.to_string())
            .output()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(expected, String::from_utf8_lossy(&output.stdout));
    }
}

#[test]
fn integration_test_dice_roll_bad_input() {
    Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["roll", "--block-hash", "zz", "--nonce", "0"])
        .assert()
        .code(exitcode::DATAERR)
        .stdout(predicate::str::contains("Invalid block hash."));
}

#[test]
fn integration_test_dice_predict() {
    let result = Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["predict", "--block-hash", KNOWN_BLOCK, "--count", "16"])
        .ok();
    assert!(result.is_ok());

    let stdout = String::from_utf8(result.unwrap().stdout).unwrap();
    let pattern = Regex::new(r"Next winning nonce: (\d+)").unwrap();
    let captures = pattern.captures(&stdout).unwrap();
    let nonce = captures.get(1).unwrap().as_str();
    assert_eq!(nonce, "7");

    // The reported nonce rolls zero.
    Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["roll", "--block-hash", KNOWN_BLOCK, "--nonce", nonce])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Roll:   0\n"));
}

#[test]
fn integration_test_dice_predict_original_rule() {
    Command::cargo_bin("dice-cli")
        .unwrap()
        .args([
            "predict",
            "--block-hash",
            KNOWN_BLOCK,
            "--win",
            "at-most:5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nonce 4: 4 win"))
        .stdout(predicate::str::contains("Next winning nonce: 4"));
}

#[test]
fn integration_test_dice_config_round_trip() {
    let result = Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["config", "--original"])
        .ok();
    assert!(result.is_ok());
    let json = String::from_utf8(result.unwrap().stdout).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("game.json");
    let mut file = File::create(&path).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    Command::cargo_bin("dice-cli")
        .unwrap()
        .arg("config")
        .arg("--check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Config is valid."))
        .stdout(predicate::str::contains("Win:       roll <= 5"))
        .stdout(predicate::str::contains("Odds:      6/16"));
}

#[test]
fn integration_test_dice_config_rejects_unknown_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("game.json");
    let mut file = File::create(&path).unwrap();
    file.write_all(br#"{"entry_fee": "1", "jackpot": true}"#).unwrap();

    Command::cargo_bin("dice-cli")
        .unwrap()
        .arg("config")
        .arg("--check")
        .arg(&path)
        .assert()
        .code(exitcode::CONFIG);
}

#[test]
fn integration_test_dice_simulate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sim.json");
    let mut file = File::create(&path).unwrap();
    file.write_all(br#"{"rounds": 40, "honest_players": 2, "seed": 9}"#)
        .unwrap();

    let run = || {
        Command::cargo_bin("dice-cli")
            .unwrap()
            .arg("simulate")
            .arg("--sim-config")
            .arg(&path)
            .arg("--strategy")
            .arg("off-chain")
            .output()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let report: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(report["rounds"], 40);
    assert_eq!(report["strategy"], "off_chain");
}

#[test]
fn integration_test_dice_simulate_fee() {
    let output = Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["simulate", "--rounds", "30", "--players", "0", "--fee", "0.002"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let committed = report["attacker"]["committed"].as_u64().unwrap() as u128;
    assert_eq!(
        report["attacker"]["spent"],
        (committed * 2_000_000_000_000_000).to_string()
    );

    Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["simulate", "--fee", "+1"])
        .assert()
        .failure();
}

#[test]
fn integration_test_dice_simulate_original_conflicts_with_game_config() {
    Command::cargo_bin("dice-cli")
        .unwrap()
        .args(["simulate", "--original", "--game-config", "game.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}
