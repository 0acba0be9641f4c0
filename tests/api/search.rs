use airtable::{Error, SearchSpec};
use assert_matches::assert_matches;
use serde_json::json;

use crate::{BASE, setup};

fn seed_tasks(fake: &airtable_fake::FakeAirtable) {
    fake.seed("Tasks", json!({"Name": "Buy milk", "Notes": "", "Status": "Open"}));
    fake.seed("Tasks", json!({"Name": "Call Bob", "Notes": "about milk", "Status": "Done"}));
    fake.seed("Tasks", json!({"Name": "Milk the cow", "Status": "Open"}));
    fake.seed("Tasks", json!({"Name": "Walk the dog", "Status": "Open"}));
}

#[test]
fn search_any_field() {
    let (fake, client) = setup();
    seed_tasks(&fake);

    let spec = SearchSpec::new(["Name", "Notes"], "milk");
    let names = client
        .search_records("Tasks", &spec)
        .unwrap()
        .into_iter()
        .map(|r| r.get("Name").cloned().unwrap())
        .collect::<Vec<_>>();

    // FIND is case-sensitive.
    assert_eq!(names, [json!("Buy milk"), json!("Call Bob")]);
    assert!(fake.requests()[0].uri.contains("cellFormat=json&maxRecords=5"));
}

#[test]
fn search_with_extra_formula_and_limit() {
    let (fake, client) = setup();
    seed_tasks(&fake);
    for i in 0..3 {
        fake.seed("Tasks", json!({"Name": format!("milk {i}"), "Status": "Open"}));
    }

    let spec = SearchSpec::new(["Name", "Notes"], "milk")
        .with_formula("{Status}='Open'")
        .with_max_rows(3);
    let records = client.search_records("Tasks", &spec).unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.get("Status") == Some(&json!("Open"))));
    assert_eq!(records[0].get("Name"), Some(&json!("Buy milk")));
}

#[test]
fn find_by_formula() {
    let (fake, client) = setup();
    seed_tasks(&fake);

    let records = client
        .find_records_by_formula("Tasks", "{Status}='Done'", None)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("Name"), Some(&json!("Call Bob")));
}

#[test]
fn invalid_formula_is_reported() {
    let (_fake, client) = setup();

    let err = client
        .find_records_by_formula("Tasks", "NOT({Done})", None)
        .unwrap_err();
    assert_matches!(
        err,
        Error::Api { status, kind: Some(kind), .. }
            if status == 422 && kind == "INVALID_FILTER_BY_FORMULA"
    );
}

#[test]
fn base_metadata() {
    let (fake, client) = setup();

    let base = client.get_base().unwrap();
    assert_eq!(base["id"], BASE);
    assert!(base.get("collaborators").is_some());

    let uri = &fake.requests()[0].uri;
    assert_eq!(
        uri,
        &format!("/v0/meta/bases/{BASE}?include=collaborators&include=inviteLinks")
    );
}
