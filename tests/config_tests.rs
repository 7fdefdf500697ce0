use clap::{CommandFactory, FromArgMatches, Parser};
use replex::config::RunConfig;
use replex::ReplexError;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: RunConfig,
}

fn parse(args: &[&str]) -> (RunConfig, clap::ArgMatches) {
    let argv = std::iter::once("replex").chain(args.iter().copied());
    let matches = TestCli::command().get_matches_from(argv);
    let cli = TestCli::from_arg_matches(&matches).unwrap();
    (cli.config, matches)
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("run.json");
    let mut f = File::create(&path).unwrap();
    write!(f, "{}", body).unwrap();
    path
}

#[test]
fn test_load_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{ "ladder": { "temperatures": [1.0, 1.5, 2.25] }, "exchange": { "steps": 500, "seed": 3 } }"#,
    );

    let config = RunConfig::load_from_file(&path).unwrap();
    assert_eq!(config.ladder.temperatures().unwrap(), vec![1.0, 1.5, 2.25]);
    assert_eq!(config.exchange.steps, 500);
    assert_eq!(config.exchange.seed, Some(3));
    assert_eq!(config.exchange.exchange_interval, 100);
    assert_eq!(config.exchange.cutoff, 100.0);
    assert!(!config.exchange.history);
}

#[test]
fn test_load_rejects_bad_ladder() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"{ "ladder": { "temperatures": [1.0, -2.0] } }"#);
    assert!(matches!(
        RunConfig::load_from_file(&path),
        Err(ReplexError::InvalidTemperature { position: 1, .. })
    ));
}

#[test]
fn test_load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "{ not json");
    assert!(matches!(
        RunConfig::load_from_file(&path),
        Err(ReplexError::Json(_))
    ));
}

#[test]
fn test_cli_overrides_only_typed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{ "exchange": { "steps": 500, "exchange_interval": 50, "seed": 1 } }"#,
    );

    let (cli, matches) = parse(&["--seed", "9", "-r", "6"]);
    let mut config = RunConfig::load_from_file(&path).unwrap();
    config.merge_from_cli(&cli, &matches);

    assert_eq!(config.exchange.seed, Some(9));
    assert_eq!(config.exchange.steps, 500);
    assert_eq!(config.exchange.exchange_interval, 50);
    assert_eq!(config.ladder.replicas, 6);
}

#[test]
fn test_cli_defaults_match_serde_defaults() {
    let (cli, _) = parse(&[]);
    assert_eq!(cli, RunConfig::default());
}

#[test]
fn test_temperature_list_parses() {
    let (cli, _) = parse(&["--temperatures", "0.5,1,2", "-i", "7"]);
    assert_eq!(cli.ladder.temperatures().unwrap(), vec![0.5, 1.0, 2.0]);
    assert_eq!(cli.exchange.exchange_interval, 7);
}

#[test]
fn test_config_json_roundtrip() {
    let config = RunConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
