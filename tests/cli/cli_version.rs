use predicates::prelude::*;

use crate::cli::Env;

#[test]
fn cli_version() {
    // Needs no credentials.
    Env::new()
        .bare()
        .args(["version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(concat!(
            "airtable ",
            env!("CARGO_PKG_VERSION")
        )));
}
