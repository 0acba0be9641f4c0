use predicates::str::contains;
use serde_json::json;

use crate::cli::{BASE, Env, TOKEN};

#[test]
fn missing_token() {
    Env::new()
        .bare()
        .env("AIRTABLE_BASE", BASE)
        .args(["find", "Tasks"])
        .assert()
        .failure()
        .stderr(contains("No access token found"));
}

#[test]
fn invalid_timeout() {
    let env = Env::new();
    env.airtable()
        .args(["--timeout", "-5", "find", "Tasks"])
        .assert()
        .failure()
        .stderr(contains("Invalid timeout value: -5"));

    env.airtable()
        .args(["--timeout", "-1", "find", "Tasks"])
        .assert()
        .success();
}

#[test]
fn named_profile_from_config_file() {
    let env = Env::new();
    env.fake.seed("Tasks", json!({"Name": "from config"}));

    let config = format!(
        "profiles:\n  default:\n    access_token: patWrong\n    base: {BASE}\n    api_root: {root}\n  \
         fake:\n    access_token: {TOKEN}\n    base: {BASE}\n    api_root: {root}\n",
        root = env.fake.api_root()
    );
    let dir = env.home().join(".config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("airtable.yaml"), config).unwrap();

    env.bare()
        .args(["-P", "fake", "find", "Tasks"])
        .assert()
        .success()
        .stdout(contains("from config"));

    env.bare()
        .env("AIRTABLE_PROFILE", "fake")
        .args(["find", "Tasks"])
        .assert()
        .success();

    // The default profile has the wrong token.
    env.bare()
        .args(["find", "Tasks"])
        .assert()
        .failure()
        .stderr(contains("401 Unauthorized"));

    // The environment overrides the file.
    env.bare()
        .env("AIRTABLE_ACCESS_TOKEN", TOKEN)
        .args(["find", "Tasks"])
        .assert()
        .success();

    env.bare()
        .args(["-P", "prod", "find", "Tasks"])
        .assert()
        .failure()
        .stderr(contains("Profile 'prod' not found"));
}
