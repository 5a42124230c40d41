use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("repos/orgA/repoA")).unwrap();
    fs::create_dir_all(root.join("repos/orgB/repoB")).unwrap();
    fs::write(root.join("repos/orgA/repoA/train.py"), "import sklearn\nmodel.fit(X, y)\n").unwrap();
    fs::write(root.join("repos/orgB/repoB/serve.py"), "import torch\nmodel.predict(x)\n").unwrap();
    fs::write(root.join("producers.csv"), "library,Keyword\nsklearn,.fit(\ntorch,.backward(\n").unwrap();
    fs::write(root.join("consumers.csv"), "library,Keyword\ntorch,.predict(\n").unwrap();
    dir
}

fn scan(dir: &TempDir) -> Command {
    let root = dir.path();
    let mut cmd = Command::cargo_bin("modelscout").unwrap();
    cmd.arg("scan")
        .arg("--input")
        .arg(root.join("repos"))
        .arg("--output")
        .arg(root.join("out"))
        .arg("--producer-dict")
        .arg(root.join("producers.csv"))
        .arg("--consumer-dict")
        .arg(root.join("consumers.csv"));
    cmd
}

#[test]
fn scan_then_summary() {
    let dir = setup();
    scan(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 scanned").and(predicate::str::contains("producers: 1, consumers: 1")));

    Command::cargo_bin("modelscout")
        .unwrap()
        .args(["summary", "--json", "--output"])
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_projects\": 2"));
}

#[test]
fn missing_corpus_is_fatal() {
    let dir = setup();
    Command::cargo_bin("modelscout")
        .unwrap()
        .arg("scan")
        .arg("--input")
        .arg(dir.path().join("nowhere"))
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--producer-dict")
        .arg(dir.path().join("producers.csv"))
        .arg("--consumer-dict")
        .arg(dir.path().join("consumers.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("corpus root does not exist"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_dictionary_is_fatal() {
    let dir = setup();
    fs::remove_file(dir.path().join("consumers.csv")).unwrap();
    scan(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("library dictionary not found"));
}

#[test]
fn evaluate_against_oracle() {
    let dir = setup();
    scan(&dir).assert().success();
    let oracle = dir.path().join("oracle.csv");
    fs::write(&oracle, "ProjectName,Is_Real_ML_producer\norgA/repoA,Yes\norgB/repoB,No\n").unwrap();

    Command::cargo_bin("modelscout")
        .unwrap()
        .args(["evaluate", "--role", "producer", "--output"])
        .arg(dir.path().join("out"))
        .arg("--oracle")
        .arg(&oracle)
        .assert()
        .success()
        .stdout(predicate::str::contains("tp=1 fp=0 tn=1 fn=0"))
        .stdout(predicate::str::contains("accuracy=1.0000"));
}
