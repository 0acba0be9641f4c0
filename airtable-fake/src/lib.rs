//! An in-memory stand-in for the Airtable REST API.
//!
//! [FakeAirtable::start] serves the record and base-metadata endpoints on a
//! random local port from a background thread, so blocking clients can be
//! tested against real HTTP. Tables are created on first use. Only the
//! formulas the client generates are understood; anything else is rejected
//! with `422 INVALID_FILTER_BY_FORMULA`.

mod formula;

use std::{
    collections::{BTreeMap, HashMap},
    io,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    thread,
};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::oneshot;
use tracing::debug;

use crate::formula::Filter;

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_BATCH_SIZE: usize = 10;
const CREATED_TIME: &str = "2024-01-01T00:00:00.000Z";

/// A request as received by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequest {
    /// The HTTP method.
    pub method: String,
    /// The path and query, as sent.
    pub uri: String,
    /// The `Authorization` header, if any.
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    fields: Map<String, Value>,
}

impl StoredRecord {
    fn to_json(&self) -> Value {
        json!({"id": self.id, "createdTime": CREATED_TIME, "fields": self.fields})
    }
}

#[derive(Debug)]
struct Store {
    token: String,
    tables: BTreeMap<String, Vec<StoredRecord>>,
    next_id: usize,
    page_size: usize,
    rate_limited: usize,
    received: Vec<ReceivedRequest>,
}

impl Store {
    fn insert(&mut self, table: &str, fields: Map<String, Value>) -> StoredRecord {
        self.next_id += 1;
        let record = StoredRecord {
            id: format!("rec{:014}", self.next_id),
            fields,
        };

        self.tables
            .entry(table.to_owned())
            .or_default()
            .push(record.clone());
        record
    }

    fn find_mut(&mut self, table: &str, id: &str) -> Option<&mut StoredRecord> {
        self.tables
            .get_mut(table)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
    }
}

type Shared = Arc<Mutex<Store>>;

fn lock(store: &Shared) -> MutexGuard<'_, Store> {
    // A panicking handler shouldn't take every later test down with it.
    store.lock().unwrap_or_else(|e| e.into_inner())
}

/// A running fake server. It shuts down when dropped.
#[derive(Debug)]
pub struct FakeAirtable {
    addr: SocketAddr,
    store: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeAirtable {
    /// Start serving on a random local port. Requests must carry
    /// `Authorization: Bearer <token>`.
    pub fn start(token: &str) -> io::Result<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let store = Arc::new(Mutex::new(Store {
            token: token.to_owned(),
            tables: BTreeMap::new(),
            next_id: 0,
            page_size: DEFAULT_PAGE_SIZE,
            rate_limited: 0,
            received: Vec::new(),
        }));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (tx, rx) = oneshot::channel::<()>();
        let app = app(store.clone());
        thread::spawn(move || {
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await
            })
        });

        debug!(%addr, "fake airtable listening");
        Ok(Self {
            addr,
            store,
            shutdown: Some(tx),
        })
    }

    /// The root to configure clients with, e.g. `http://127.0.0.1:1234/v0`.
    pub fn api_root(&self) -> String {
        format!("http://{}/v0", self.addr)
    }

    /// Insert a record directly, returning its ID.
    pub fn seed(&self, table: &str, fields: Value) -> String {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        lock(&self.store).insert(table, fields).id
    }

    /// Every record in a table, in insertion order, as the API renders them.
    pub fn records(&self, table: &str) -> Vec<Value> {
        lock(&self.store)
            .tables
            .get(table)
            .map(|records| records.iter().map(StoredRecord::to_json).collect())
            .unwrap_or_default()
    }

    /// Set how many records a list response holds before paginating.
    pub fn set_page_size(&self, size: usize) {
        lock(&self.store).page_size = size.max(1);
    }

    /// Answer the next `count` requests with `429 Too Many Requests`.
    pub fn rate_limit_next(&self, count: usize) {
        lock(&self.store).rate_limited = count;
    }

    /// Every request received so far, including rejected ones.
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        lock(&self.store).received.clone()
    }
}

impl Drop for FakeAirtable {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn app(store: Shared) -> Router {
    Router::new()
        .route("/v0/meta/bases/{base}", get(get_base))
        .route("/v0/{base}/{table}", get(list_records).post(create_records))
        .route(
            "/v0/{base}/{table}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .layer(middleware::from_fn_with_state(store.clone(), gatekeeper))
        .with_state(store)
}

fn error(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"type": kind, "message": message}})),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "NOT_FOUND"}))).into_response()
}

/// Records the request, then applies authentication and rate limiting.
async fn gatekeeper(State(store): State<Shared>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let rejection = {
        let mut store = lock(&store);
        store.received.push(ReceivedRequest {
            method: req.method().to_string(),
            uri: req.uri().to_string(),
            authorization: authorization.clone(),
        });

        let expected = format!("Bearer {}", store.token);
        if authorization.as_deref() != Some(expected.as_str()) {
            Some(error(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Authentication required",
            ))
        } else if store.rate_limited > 0 {
            store.rate_limited -= 1;
            Some(
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"errors": [{"error": "RATE_LIMIT_REACHED"}]})),
                )
                    .into_response(),
            )
        } else {
            None
        }
    };

    match rejection {
        Some(resp) => resp,
        None => next.run(req).await,
    }
}

async fn get_base(Path(base): Path<String>) -> Response {
    Json(json!({
        "id": base,
        "name": "Fake base",
        "permissionLevel": "create",
        "collaborators": {"baseCollaborators": []},
        "inviteLinks": {"baseInviteLinks": []},
    }))
    .into_response()
}

async fn list_records(
    State(store): State<Shared>,
    Path((_base, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let filter = match params.get("filterByFormula").filter(|f| !f.is_empty()) {
        Some(formula) => match Filter::parse(formula) {
            Some(filter) => Some(filter),
            None => {
                return error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_FILTER_BY_FORMULA",
                    "The formula for filtering records is invalid",
                );
            }
        },
        None => None,
    };

    let max_records = params
        .get("maxRecords")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let start = match params.get("offset") {
        Some(offset) => match offset.strip_prefix("itr").and_then(|n| n.parse().ok()) {
            Some(start) => start,
            None => {
                return error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "LIST_RECORDS_ITERATOR_NOT_AVAILABLE",
                    "Invalid offset",
                );
            }
        },
        None => 0,
    };

    let store = lock(&store);
    let matched = store
        .tables
        .get(&table)
        .into_iter()
        .flatten()
        .filter(|r| filter.as_ref().is_none_or(|f| f.matches(&r.fields)))
        .take(max_records)
        .collect::<Vec<_>>();

    let end = (start + store.page_size).min(matched.len());
    let page = matched
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|r| r.to_json())
        .collect::<Vec<_>>();

    if end < matched.len() {
        Json(json!({"records": page, "offset": format!("itr{end}")})).into_response()
    } else {
        Json(json!({"records": page})).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct NewRecord {
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateBody {
    Many { records: Vec<NewRecord> },
    One(NewRecord),
}

async fn create_records(
    State(store): State<Shared>,
    Path((_base, table)): Path<(String, String)>,
    Json(body): Json<CreateBody>,
) -> Response {
    let mut store = lock(&store);
    match body {
        CreateBody::One(new) => Json(store.insert(&table, new.fields).to_json()).into_response(),
        CreateBody::Many { records } if records.len() > MAX_BATCH_SIZE => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_RECORDS",
            "Too many records",
        ),
        CreateBody::Many { records } => {
            let created = records
                .into_iter()
                .map(|new| store.insert(&table, new.fields).to_json())
                .collect::<Vec<_>>();
            Json(json!({ "records": created })).into_response()
        }
    }
}

async fn get_record(
    State(store): State<Shared>,
    Path((_base, table, id)): Path<(String, String, String)>,
) -> Response {
    match lock(&store).find_mut(&table, &id) {
        Some(record) => Json(record.to_json()).into_response(),
        None => not_found(),
    }
}

async fn replace_record(
    State(store): State<Shared>,
    Path((_base, table, id)): Path<(String, String, String)>,
    Json(body): Json<NewRecord>,
) -> Response {
    match lock(&store).find_mut(&table, &id) {
        Some(record) => {
            record.fields = body.fields;
            Json(record.to_json()).into_response()
        }
        None => not_found(),
    }
}

async fn update_record(
    State(store): State<Shared>,
    Path((_base, table, id)): Path<(String, String, String)>,
    Json(body): Json<NewRecord>,
) -> Response {
    match lock(&store).find_mut(&table, &id) {
        Some(record) => {
            record.fields.extend(body.fields);
            Json(record.to_json()).into_response()
        }
        None => not_found(),
    }
}

async fn delete_record(
    State(store): State<Shared>,
    Path((_base, table, id)): Path<(String, String, String)>,
) -> Response {
    let mut store = lock(&store);
    let Some(records) = store.tables.get_mut(&table) else {
        return not_found();
    };

    match records.iter().position(|r| r.id == id) {
        Some(pos) => {
            records.remove(pos);
            Json(json!({"id": id, "deleted": true})).into_response()
        }
        None => not_found(),
    }
}
