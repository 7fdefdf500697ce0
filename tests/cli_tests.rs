use regex::Regex;
use replex::report::read_history_csv;
use replex::scheduler::StopReason;
use replex::RunReport;
use rstest::rstest;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn replex(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_replex"))
        .args(args)
        .output()
        .expect("Failed to execute replex")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

const SMALL_RUN: [&str; 13] = [
    "run",
    "-t",
    "4",
    "--temperatures",
    "0.5,1,2,4",
    "--steps",
    "200",
    "-i",
    "10",
    "-S",
    "5",
    "--dim",
    "2",
];

#[test]
fn test_ladder_prints_geometric_rungs() {
    let out = replex(&["ladder", "--temp-min", "1", "--temp-max", "8", "-r", "4"]);
    assert!(out.status.success());

    let text = stdout(&out);
    for t in ["1.0000", "2.0000", "4.0000", "8.0000", "0.1250"] {
        assert!(text.contains(t), "missing {} in:\n{}", t, text);
    }
}

#[test]
fn test_run_writes_report_and_history() {
    let ctx = TestContext::new();
    let report_path = ctx.path("report.json");
    let history_path = ctx.path("history.csv");

    let mut args = SMALL_RUN.to_vec();
    args.extend([
        "--report",
        report_path.to_str().unwrap(),
        "--history-csv",
        history_path.to_str().unwrap(),
    ]);
    let out = replex(&args);
    assert!(out.status.success(), "stdout:\n{}", stdout(&out));

    let report = RunReport::load_json(&report_path).unwrap();
    assert_eq!(report.n_replicas, 4);
    assert_eq!(report.rounds, 19);
    assert_eq!(report.steps_completed, 200);
    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.history.as_ref().map(Vec::len), Some(19));

    let rows = read_history_csv(&history_path).unwrap();
    // 10 even rounds with 2 pairs, 9 odd rounds with 1.
    assert_eq!(rows.len(), 29);

    let summary = Regex::new(r"Rounds: 19 \| Swaps: \d+/29").unwrap();
    assert!(summary.is_match(&stdout(&out)), "stdout:\n{}", stdout(&out));
}

#[test]
fn test_sequential_flag_reproduces_parallel_run() {
    let ctx = TestContext::new();
    let par_path = ctx.path("par.json");
    let seq_path = ctx.path("seq.json");

    let mut par = SMALL_RUN.to_vec();
    par.extend(["--history", "--report", par_path.to_str().unwrap()]);
    let mut seq = SMALL_RUN.to_vec();
    seq.extend(["--history", "--sequential", "--report", seq_path.to_str().unwrap()]);

    assert!(replex(&par).status.success());
    assert!(replex(&seq).status.success());

    let par = RunReport::load_json(&par_path).unwrap();
    let seq = RunReport::load_json(&seq_path).unwrap();
    assert_eq!(par.order, seq.order);
    assert_eq!(par.stats.total_accepted(), seq.stats.total_accepted());
    let accepted = |r: &RunReport| -> Vec<bool> {
        r.history
            .iter()
            .flatten()
            .flat_map(|round| round.outcomes.iter().map(|o| o.accepted))
            .collect()
    };
    assert_eq!(accepted(&par), accepted(&seq));
}

#[test]
fn test_config_file_with_cli_override() {
    let ctx = TestContext::new();
    let config_path = ctx.path("run.json");
    let report_path = ctx.path("report.json");

    let mut f = File::create(&config_path).unwrap();
    writeln!(
        f,
        r#"{{ "ladder": {{ "temperatures": [1.0, 2.0, 4.0] }}, "exchange": {{ "steps": 300, "exchange_interval": 20, "seed": 1 }} }}"#
    )
    .unwrap();

    let out = replex(&[
        "run",
        "-c",
        config_path.to_str().unwrap(),
        "-t",
        "3",
        "--steps",
        "100",
        "--report",
        report_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stdout:\n{}", stdout(&out));

    let report = RunReport::load_json(&report_path).unwrap();
    assert_eq!(report.n_replicas, 3);
    assert_eq!(report.steps_completed, 100);
    // Interval still comes from the file: boundaries 20, 40, 60, 80.
    assert_eq!(report.rounds, 4);
}

#[test]
fn test_too_few_threads_exits_nonzero() {
    let out = replex(&["run", "-r", "4", "-t", "2", "--steps", "10"]);
    assert!(!out.status.success());

    let text = stdout(&out);
    let re = Regex::new(r"Not enough workers: 4 replicas").unwrap();
    assert!(re.is_match(&text), "stdout:\n{}", text);
}

#[rstest]
#[case(&["run", "--temperatures", "1,0,2", "--steps", "10"], "Invalid temperature")]
#[case(&["run", "-i", "0", "--steps", "10"], "exchange_interval")]
#[case(&["run", "--cutoff=-1", "--steps", "10"], "cutoff")]
#[case(&["run", "--steps", "10", "-i", "10", "--max-time", "5"], "max_time")]
#[case(&["ladder", "-r", "0"], "empty")]
fn test_bad_input_rejected(#[case] args: &[&str], #[case] needle: &str) {
    let out = replex(args);
    assert!(!out.status.success());
    let text = stdout(&out);
    assert!(text.contains(needle), "missing {:?} in:\n{}", needle, text);
}
