use predicates::str::{contains, starts_with};
use serde_json::{Value, json};

use crate::cli::Env;

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn create_and_find() {
    let env = Env::new();

    env.airtable()
        .args(["create", "Tasks", "-s", "Name=Alice", "-s", "Age=30"])
        .assert()
        .success()
        .stderr(contains("Created record rec"));

    let records = env.fake.records("Tasks");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["fields"], json!({"Name": "Alice", "Age": 30}));

    let out = env
        .airtable()
        .args(["-O", "json", "find", "Tasks", "-w", "Name=Alice"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let found = stdout_json(&out);
    assert_eq!(found[0]["id"], records[0]["id"]);
    assert_eq!(found[0]["fields"]["Age"], 30);
}

#[test]
fn tty_output() {
    let env = Env::new();
    let id = env.fake.seed("Tasks", json!({"Name": "Alice"}));

    env.airtable()
        .args(["ls", "Tasks"])
        .assert()
        .success()
        .stdout(starts_with("ID"))
        .stdout(contains(id.as_str()))
        .stdout(contains(r#"{"Name":"Alice"}"#));
}

#[test]
fn get_by_id() {
    let env = Env::new();
    let id = env.fake.seed("Tasks", json!({"Name": "Alice"}));

    env.airtable()
        .args(["-O", "json", "get", "Tasks", id.as_str()])
        .assert()
        .success()
        .stdout(contains(r#""Name":"Alice""#));

    env.airtable()
        .args(["get", "Tasks", "recMissing"])
        .assert()
        .failure()
        .stderr(contains("404 Not Found"));
}

#[test]
fn update_and_set() {
    let env = Env::new();
    let id = env
        .fake
        .seed("Tasks", json!({"Name": "Alice", "Status": "Open", "Notes": "x"}));

    env.airtable()
        .args(["update", "Tasks", "-w", "Name=Alice", "-s", "Status=Done"])
        .assert()
        .success()
        .stderr(contains(format!("Updated record {id}")));
    assert_eq!(
        env.fake.records("Tasks")[0]["fields"],
        json!({"Name": "Alice", "Status": "Done", "Notes": "x"})
    );

    env.airtable()
        .args(["update", "Tasks", "--id", id.as_str(), "-s", "Notes=y"])
        .assert()
        .success();
    assert_eq!(env.fake.records("Tasks")[0]["fields"]["Notes"], "y");

    env.airtable()
        .args(["set", "Tasks", "-w", "Name=Alice", "-s", "Name=Alice"])
        .assert()
        .success()
        .stderr(contains(format!("Replaced record {id}")));
    assert_eq!(
        env.fake.records("Tasks")[0]["fields"],
        json!({"Name": "Alice"})
    );

    env.airtable()
        .args(["update", "Tasks", "-s", "Notes=z"])
        .assert()
        .failure()
        .stderr(contains("Either --id or --where is required"));
}

#[test]
fn search() {
    let env = Env::new();
    env.fake.seed("Tasks", json!({"Name": "Buy milk"}));
    env.fake.seed("Tasks", json!({"Name": "Walk the dog", "Notes": "no milk"}));
    env.fake.seed("Tasks", json!({"Name": "Call Bob"}));

    let out = env
        .airtable()
        .args(["-O", "json", "search", "Tasks", "milk", "-f", "Name", "-f", "Notes"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(stdout_json(&out).as_array().unwrap().len(), 2);
}

#[test]
fn rm_and_flush() {
    let env = Env::new();
    env.fake.seed("Tasks", json!({"Name": "A", "Status": "Done"}));
    env.fake.seed("Tasks", json!({"Name": "B", "Status": "Done"}));
    env.fake.seed("Tasks", json!({"Name": "C", "Status": "Open"}));
    env.fake.seed("Tasks", json!({"Name": "D", "Status": "Open"}));

    env.airtable()
        .args(["rm", "Tasks", "-w", "Status=Done"])
        .assert()
        .failure()
        .stderr(contains("2 records found"));

    env.airtable()
        .args(["rm", "Tasks", "-w", "Status=Done", "--all"])
        .assert()
        .success();
    assert_eq!(env.fake.records("Tasks").len(), 2);

    env.airtable()
        .args(["rm", "Tasks", "-w", "Name=Nobody"])
        .assert()
        .failure()
        .stderr(contains("No record found"));

    env.airtable()
        .args(["rm", "Tasks", "-w", "Name=Nobody", "--if-exists"])
        .assert()
        .success();

    env.airtable()
        .args(["flush", "Tasks"])
        .assert()
        .failure()
        .stderr(contains("without --yes"));
    assert_eq!(env.fake.records("Tasks").len(), 2);

    env.airtable()
        .args(["delete", "Tasks", "-w", "Name=C"])
        .assert()
        .success()
        .stderr(contains("Deleted record"));

    env.airtable().args(["flush", "Tasks", "--yes"]).assert().success();
    assert!(env.fake.records("Tasks").is_empty());
}

#[test]
fn base() {
    let env = Env::new();

    let out = env
        .airtable()
        .args(["-O", "json", "base"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let base = stdout_json(&out);
    assert_eq!(base["id"], crate::cli::BASE);
    assert!(base["inviteLinks"].is_object());
}
