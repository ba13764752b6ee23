use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docvec_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_docvec"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.",
    )
    .unwrap();
    fs::write(
        files_dir.join("gamma.txt"),
        "Gamma plain text file about deployment and infrastructure.",
    )
    .unwrap();

    let config_content = format!(
        r#"[store]
backend = "sqlite"
path = "{root}/data/docvec.sqlite"

[ingest]
root = "{root}/files"

[server]
bind = "127.0.0.1:0"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docvec.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docvec(config_path: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let binary = docvec_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("DOC_PATH")
        .env_remove("DOCVEC_DB")
        .env_remove("API_PORT")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docvec binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code())
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, code) = run_docvec(&config_path, &["init"]);
    assert_eq!(code, Some(0), "init failed: {}", stderr);
    assert!(stdout.contains("sqlite store initialized"));
    assert!(tmp.path().join("data/docvec.sqlite").exists());

    let (_, _, code) = run_docvec(&config_path, &["init"]);
    assert_eq!(code, Some(0));
}

#[test]
fn test_ingest_prints_summary_and_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, code) = run_docvec(&config_path, &["ingest", "--progress", "off"]);
    assert_eq!(code, Some(0), "ingest failed: {}", stderr);
    assert!(stdout.contains("files processed: 2"), "{}", stdout);
    assert!(stdout.contains("chunks added: 2"), "{}", stdout);
    assert!(stdout.contains("errors: 0"), "{}", stdout);

    let (stdout, _, code) = run_docvec(&config_path, &["ingest", "--progress", "off"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("chunks added: 0"), "{}", stdout);
    assert!(stdout.contains("chunks skipped: 2"), "{}", stdout);
}

#[test]
fn test_ingest_missing_root_exits_one() {
    let (tmp, config_path) = setup_test_env();
    let missing = tmp.path().join("missing");
    let (_, stderr, code) = run_docvec(
        &config_path,
        &["ingest", "--doc-path", missing.to_str().unwrap()],
    );
    assert_eq!(code, Some(1));
    assert!(stderr.contains("does not exist"), "{}", stderr);
}

#[test]
fn test_invalid_config_exits_one() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("config/bad.toml");
    fs::write(&bad, "[chunking]\nchunk_size = 10\nchunk_overlap = 10\n").unwrap();
    let (_, stderr, code) = run_docvec(&bad, &["stats"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("chunk_overlap"), "{}", stderr);
}

#[test]
fn test_query_json_returns_exact_match_first() {
    let (_tmp, config_path) = setup_test_env();
    run_docvec(&config_path, &["ingest", "--progress", "off"]);

    let (stdout, stderr, code) = run_docvec(
        &config_path,
        &[
            "query",
            "Gamma plain text file about deployment and infrastructure.",
            "--json",
        ],
    );
    assert_eq!(code, Some(0), "query failed: {}", stderr);
    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0]["filename"].as_str().unwrap().ends_with("gamma.txt"));
    assert_eq!(hits[0]["score"].as_f64().unwrap(), 1.0);
}

#[test]
fn test_query_empty_store_prints_no_results() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, code) = run_docvec(&config_path, &["query", "anything"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("No results."));
}

#[test]
fn test_stats_json() {
    let (_tmp, config_path) = setup_test_env();
    run_docvec(&config_path, &["ingest", "--progress", "off"]);
    let (stdout, _, code) = run_docvec(&config_path, &["stats", "--json"]);
    assert_eq!(code, Some(0));
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["unique_files"], 2);
    assert_eq!(stats["total_chunks"], 2);
    assert_eq!(stats["backend"], "sqlite");
}
