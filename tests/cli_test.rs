use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

const REFERENCE: &str = "tests/fixtures/reference.json";

#[test]
fn test_cli_tariffs() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["tariffs", REFERENCE, "--region", "CIS", "--currency", "usd"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(
            "region,method_name,payout_currency,min_amount,max_amount",
        ))
        .stdout(predicate::str::contains(
            "CIS,VISA,USD,0.75,5,CIS,,0.018,0.02,EUR,0.05,0.05,EUR",
        ))
        .stdout(predicate::str::contains(
            "CIS,VISA,USD,5,100,CIS,,0.016,0.02,EUR,0.04,0.05,EUR",
        ))
        .stdout(predicate::str::contains(",EUR,0.75,5,").not());

    Ok(())
}

#[test]
fn test_cli_tariffs_with_range() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args([
        "tariffs", REFERENCE, "--region", "CIS", "--currency", "USD", "--from", "0.75", "--to", "5",
    ]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let output = String::from_utf8(output)?;
    // header plus the single overlapping tier
    assert_eq!(output.lines().count(), 2);

    Ok(())
}

#[test]
fn test_cli_fee() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args([
        "fee", REFERENCE, "--method", "card", "--region", "EU", "--brand", "visa", "--currency",
        "USD", "--amount", "150",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tier_index,transaction_percent_fee"))
        .stdout(predicate::str::contains("1,1.8,USD,0.05,USD,0,USD,0.02,USD"));

    Ok(())
}

#[test]
fn test_cli_rejects_unknown_brand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args([
        "fee", REFERENCE, "--method", "card", "--region", "EU", "--brand", "discover",
        "--currency", "USD", "--amount", "10",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown card brand"));

    Ok(())
}

#[test]
fn test_cli_missing_fee_set() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args([
        "fee", REFERENCE, "--method", "qiwi", "--region", "EU", "--currency", "USD", "--amount",
        "10",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("sf000006"));

    Ok(())
}

#[test]
fn test_cli_settings_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(settings, "fee_precision = 0")?;

    // the file override changes how seeded fee sets are normalized
    let mut cmd = Command::new(cargo_bin!());
    cmd.args([
        "--config",
        settings.path().to_str().unwrap_or_default(),
        "fee",
        REFERENCE,
        "--method",
        "card",
        "--region",
        "EU",
        "--brand",
        "VISA",
        "--currency",
        "USD",
        "--amount",
        "150",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,2,USD,0,USD,0,USD,0,USD"));

    Ok(())
}

#[test]
fn test_cli_missing_reference_file() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["tariffs", "tests/fixtures/absent.json", "--region", "CIS"]);

    cmd.assert().failure();
}
