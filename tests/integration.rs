use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn kbi_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("kbi");
    path
}

const TACTICS: &str = "\
T001: Morning identity rehearsal
Week: 1
Category: identity
Spend two minutes rehearsing who you are becoming.

T002: Energy audit
Week: 2
Category: energy
List what drained you yesterday and what financing questions still scare you.

T003: Single-task sprint
Week: 2
Category: focus
Twenty-five minutes, one task, nothing else.";

const PROTOCOLS: &str = "\
## burnout + warrior
When intensity turns against you.
Practice: 60-second cold reset
Step outside and breathe until the edge softens.
Practice: conquest journaling
Write the day's one battle worth fighting.

## not a real heading
Practice: orphaned
This section's heading fails the pattern and is skipped.";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let content_dir = root.join("content");
    fs::create_dir_all(&content_dir).unwrap();
    fs::write(content_dir.join("tactics.txt"), TACTICS).unwrap();
    fs::write(content_dir.join("protocols.txt"), PROTOCOLS).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/kbi.sqlite"

[sources]
root = "{}/content"

[[sources.documents]]
file = "tactics.txt"
family = "tactics"
collection = "coaching"

[[sources.documents]]
file = "protocols.txt"
family = "protocol"
collection = "coaching"
"#,
        root.display(),
        root.display()
    );

    let config_path = config_dir.join("kbi.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_kbi(config: &PathBuf, args: &[&str]) -> std::process::Output {
    Command::new(kbi_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .output()
        .expect("failed to run kbi binary")
}

#[test]
fn test_init_creates_database_and_is_idempotent() {
    let (tmp, config) = setup_test_env();

    let first = run_kbi(&config, &["init"]);
    assert!(first.status.success(), "init failed: {:?}", first);
    assert!(tmp.path().join("data/kbi.sqlite").exists());

    let second = run_kbi(&config, &["init"]);
    assert!(second.status.success(), "second init failed: {:?}", second);
}

#[test]
fn test_sources_reports_ok_status() {
    let (_tmp, config) = setup_test_env();

    let output = run_kbi(&config, &["sources"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tactics.txt"));
    assert!(stdout.contains("protocols.txt"));
    assert!(stdout.contains("OK"));
    assert!(!stdout.contains("MISSING"));
}

#[test]
fn test_sources_reports_missing_file() {
    let (tmp, config) = setup_test_env();
    fs::remove_file(tmp.path().join("content/protocols.txt")).unwrap();

    let output = run_kbi(&config, &["sources"]);
    assert!(output.status.success()); // sources lists status, it does not abort
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MISSING"));
}

#[test]
fn test_dry_run_counts_passages_without_touching_database() {
    let (tmp, config) = setup_test_env();

    let output = run_kbi(&config, &["ingest", "--dry-run"]);
    assert!(output.status.success(), "dry run failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);

    // 3 tactics + 2 protocol practices in the primary collection, plus one
    // financing copy of the tactic that mentions financing.
    assert!(stdout.contains("Passages:      6"), "stdout: {stdout}");
    assert!(stdout.contains("coaching"));
    assert!(stdout.contains("financing"));

    // The malformed protocol heading surfaces as a warning, not a crash.
    assert!(stdout.contains("Warnings:"));
    assert!(stdout.contains("not a real heading"));

    // Dry run never creates the database.
    assert!(!tmp.path().join("data/kbi.sqlite").exists());
}

#[test]
fn test_missing_source_file_exits_2_before_any_work() {
    let (tmp, config) = setup_test_env();
    fs::remove_file(tmp.path().join("content/tactics.txt")).unwrap();

    let output = run_kbi(&config, &["ingest", "--dry-run"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr: {stderr}");
}

#[test]
fn test_ingest_without_provider_exits_2() {
    let (_tmp, config) = setup_test_env();

    let output = run_kbi(&config, &["ingest"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("disabled"), "stderr: {stderr}");
}

#[test]
fn test_missing_credential_exits_2() {
    let (tmp, config) = setup_test_env();

    // Enable the provider; the credential is stripped by run_kbi.
    let mut body = fs::read_to_string(&config).unwrap();
    body.push_str(
        "\n[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n",
    );
    fs::write(&config, body).unwrap();

    let output = run_kbi(&config, &["ingest"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {stderr}");

    // Pre-flight failure: no database was created.
    assert!(!tmp.path().join("data/kbi.sqlite").exists());
}

#[test]
fn test_invalid_config_exits_2() {
    let (_tmp, config) = setup_test_env();

    let mut body = fs::read_to_string(&config).unwrap();
    body.push_str("\n[embedding]\nprovider = \"cohere\"\nmodel = \"m\"\ndims = 8\n");
    fs::write(&config, body).unwrap();

    let output = run_kbi(&config, &["stats"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("provider"), "stderr: {stderr}");
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config) = setup_test_env();

    let init = run_kbi(&config, &["init"]);
    assert!(init.status.success());

    let output = run_kbi(&config, &["stats"]);
    assert!(output.status.success(), "stats failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Passages:    0"), "stdout: {stdout}");
}

#[test]
fn test_json_progress_goes_to_stderr() {
    let (_tmp, config) = setup_test_env();

    let output = run_kbi(&config, &["ingest", "--dry-run", "--progress", "json"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(r#""phase":"loading""#), "stderr: {stderr}");
    assert!(stderr.contains(r#""phase":"segmenting""#), "stderr: {stderr}");

    // stdout stays parseable: no progress events there.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("phase"));
}

#[test]
fn test_move_mode_reroutes_in_dry_run_counts() {
    let (_tmp, config) = setup_test_env();

    let mut body = fs::read_to_string(&config).unwrap();
    body.push_str("\n[routing]\nmode = \"move\"\n");
    fs::write(&config, body).unwrap();

    let output = run_kbi(&config, &["ingest", "--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    // The financing tactic moved instead of copying: 6 total becomes 5.
    assert!(stdout.contains("Passages:      5"), "stdout: {stdout}");
}
