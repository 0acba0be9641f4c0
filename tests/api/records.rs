use airtable::{Criteria, Error};
use assert_matches::assert_matches;
use serde_json::json;

use crate::{TOKEN, criteria, fields, setup};

#[test]
fn create_then_get() {
    let (fake, client) = setup();

    let created = client
        .create_record("Tasks", &fields(json!({"Name": "Write tests", "Points": 3})))
        .unwrap();
    assert!(created.id().starts_with("rec"));
    assert!(created.created_time().is_some());

    let fetched = client.get_record("Tasks", created.id()).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fake.records("Tasks").len(), 1);
}

#[test]
fn every_request_is_authenticated() {
    let (fake, client) = setup();
    fake.seed("Tasks", json!({"Name": "A"}));

    client.find_records("Tasks", &Criteria::new()).unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {TOKEN}").as_str())
    );
}

#[test]
fn wrong_token_is_an_api_error() {
    let (fake, _) = setup();
    let client = airtable::AirtableClient::from_profile(
        airtable::Profile::new("patWrong", "appIntegration").with_api_root(&fake.api_root()),
    )
    .unwrap();

    let err = client.get_record("Tasks", "rec1").unwrap_err();
    assert_matches!(
        err,
        Error::Api { status, kind: Some(kind), .. }
            if status == 401 && kind == "AUTHENTICATION_REQUIRED"
    );
}

#[test]
fn get_missing_record() {
    let (_fake, client) = setup();

    let err = client.get_record("Tasks", "recMissing").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
}

#[test]
fn set_clears_other_fields() {
    let (fake, client) = setup();
    fake.seed("Tasks", json!({"Name": "A", "Status": "Open", "Notes": "keep?"}));

    let record = client
        .set_record(
            "Tasks",
            &criteria(json!({"Name": "A"})),
            &fields(json!({"Name": "A", "Status": "Done"})),
        )
        .unwrap();

    assert_eq!(record.fields(), &fields(json!({"Name": "A", "Status": "Done"})));
    assert_eq!(record.get("Notes"), None);

    let stored = client.get_record("Tasks", record.id()).unwrap();
    assert_eq!(stored.fields(), &fields(json!({"Name": "A", "Status": "Done"})));
}

#[test]
fn update_keeps_other_fields() {
    let (fake, client) = setup();
    fake.seed("Tasks", json!({"Name": "A", "Status": "Open", "Notes": "keep"}));

    let record = client
        .update_record(
            "Tasks",
            &criteria(json!({"Name": "A"})),
            &fields(json!({"Status": "Done"})),
        )
        .unwrap();

    assert_eq!(record.get("Status"), Some(&json!("Done")));
    assert_eq!(record.get("Notes"), Some(&json!("keep")));

    let stored = client.get_record("Tasks", record.id()).unwrap();
    assert_eq!(
        stored.fields(),
        &fields(json!({"Name": "A", "Status": "Done", "Notes": "keep"}))
    );

    let methods = fake
        .requests()
        .into_iter()
        .map(|r| r.method)
        .collect::<Vec<_>>();
    assert_eq!(methods, ["GET", "PATCH", "GET"]);
}

#[test]
fn lookup_with_spaces_and_quotes() {
    let (fake, client) = setup();
    fake.seed("People and Pets", json!({"Full Name": "Pat O'Brien", "Age": 41}));
    fake.seed("People and Pets", json!({"Full Name": "Sam Smith", "Age": 41}));

    let people = client.table("People and Pets");
    let record = people
        .find_record(&criteria(json!({"Full Name": "Pat O'Brien"})))
        .unwrap()
        .unwrap();
    assert_eq!(record.get("Age"), Some(&json!(41)));

    let err = people
        .find_record(&criteria(json!({"Age": 41})))
        .unwrap_err();
    assert_matches!(err, Error::AmbiguousResult { count: 2, .. });

    assert!(!people
        .contains_record(&criteria(json!({"Full Name": "Nobody"})))
        .unwrap());
}

#[test]
fn create_records_in_batches() {
    let (fake, client) = setup();

    let input = (0..23)
        .map(|i| fields(json!({"Name": format!("task {i}")})))
        .collect::<Vec<_>>();
    let created = client.create_records("Tasks", &input).unwrap();

    assert_eq!(created.len(), 23);
    assert_eq!(created[22].get("Name"), Some(&json!("task 22")));
    assert_eq!(fake.records("Tasks").len(), 23);
    assert_eq!(fake.requests().len(), 3);
}

#[test]
fn delete_one_and_many() {
    let (fake, client) = setup();
    fake.seed("Tasks", json!({"Name": "A", "Status": "Done"}));
    fake.seed("Tasks", json!({"Name": "B", "Status": "Done"}));
    fake.seed("Tasks", json!({"Name": "C", "Status": "Open"}));

    let deleted = client
        .delete_record("Tasks", &criteria(json!({"Name": "C"})))
        .unwrap();
    assert!(deleted.deleted);

    client
        .delete_records("Tasks", &criteria(json!({"Status": "Done"})))
        .unwrap();
    assert!(fake.records("Tasks").is_empty());

    let err = client
        .delete_record("Tasks", &criteria(json!({"Name": "A"})))
        .unwrap_err();
    assert_matches!(err, Error::NotFound { .. });
}

#[test]
fn flush_empties_the_table() {
    let (fake, client) = setup();
    fake.set_page_size(2);
    for i in 0..5 {
        fake.seed("Tasks", json!({ "N": i }));
    }
    fake.seed("Other", json!({"N": 0}));

    client.flush_records("Tasks").unwrap();

    assert!(fake.records("Tasks").is_empty());
    assert_eq!(fake.records("Other").len(), 1);
}

#[test]
fn percent_signs_match_literally() {
    let (fake, client) = setup();
    let literal = fake.seed("Codes", json!({"Code": "A%41", "Rate (%)": 5}));
    fake.seed("Codes", json!({"Code": "AA", "Rate (%)": 5}));

    let found = client
        .find_records("Codes", &criteria(json!({"Code": "A%41"})))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), literal);

    client
        .update_record(
            "Codes",
            &criteria(json!({"Code": "A%41", "Rate (%)": 5})),
            &fields(json!({"Rate (%)": 6})),
        )
        .unwrap();
    assert_eq!(fake.records("Codes")[0]["fields"]["Rate (%)"], 6);
    assert_eq!(fake.records("Codes")[1]["fields"]["Rate (%)"], 5);
}

#[test]
fn trailing_backslash_in_value() {
    let (fake, client) = setup();
    let id = fake.seed("Paths", json!({"Path": "C:\\"}));
    fake.seed("Paths", json!({"Path": "C:"}));

    let record = client
        .find_record("Paths", &criteria(json!({"Path": "C:\\"})))
        .unwrap()
        .unwrap();
    assert_eq!(record.id(), id);
}
