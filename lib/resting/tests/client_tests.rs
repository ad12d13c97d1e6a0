//! Pipeline tests for `RestingClient` over in-memory transports.

mod support;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use assert2::{check, let_assert};
use resting::prelude::*;
use resting::{
    DynamicHeaderProvider, DynamicPathVariableProvider, FileRef, KeyStrategy, QueryEncoder,
    RestingClient,
};
use support::{Echo, MockTransport, entries};
use tempfile::{TempDir, tempdir};

fn client(transport: &MockTransport) -> RestingClient {
    RestingClient::builder("https://api.example.com/")
        .transport(transport.clone())
        .build()
        .expect("client")
}

#[derive(Debug, Serialize)]
struct Search {
    #[serde(rename = "queryText")]
    query_text: String,
    tags: Vec<String>,
    filter: Filter,
}

#[derive(Debug, Serialize)]
struct Filter {
    min: u32,
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct Profile {
    name: String,
    avatar: FileRef,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
struct Created {
    id: u64,
}

// ============================================================================
// Conversion through the client
// ============================================================================

#[tokio::test]
async fn query_endpoint_flattens_body() {
    let transport = MockTransport::echo();
    let client = RestingClient::builder("https://api.example.com/")
        .query_encoder(QueryEncoder::new().with_key_strategy(KeyStrategy::SnakeCase))
        .transport(transport.clone())
        .build()
        .expect("client");

    const SEARCH: Endpoint<Search, Echo> = Endpoint::get("/search");
    let request = Request::new(
        SEARCH,
        Search {
            query_text: "rust".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            filter: Filter {
                min: 2,
                label: None,
            },
        },
    );

    let echo = client.perform(request).await.expect("echo").into_body();

    let url = url::Url::parse(&echo.url).expect("url");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    check!(
        pairs
            == vec![
                ("query_text".to_string(), "rust".to_string()),
                ("tags[]".to_string(), "a".to_string()),
                ("tags[]".to_string(), "b".to_string()),
                ("filter[min]".to_string(), "2".to_string()),
                ("filter[label]".to_string(), String::new()),
            ]
    );
    check!(echo.method == "GET");
    check!(echo.body.is_empty());
}

#[tokio::test]
async fn empty_query_adds_no_question_mark() {
    let transport = MockTransport::echo();
    let client = client(&transport);

    #[derive(Serialize)]
    struct Tags {
        tags: Vec<String>,
    }
    const LIST: Endpoint<Tags, Echo> = Endpoint::get("/items");

    let echo = client
        .perform(Request::new(LIST, Tags { tags: vec![] }))
        .await
        .expect("echo")
        .into_body();

    check!(echo.url == "https://api.example.com/items");
}

#[tokio::test]
async fn request_values_win_over_providers() {
    let headers = DynamicHeaderProvider::new();
    headers.add("X-Tenant", "default");
    headers.add_with("X-Request-Id", || Some("generated".to_string()));
    headers.add_with("X-Skipped", || None);
    let variables = DynamicPathVariableProvider::new();
    variables.add("org", "acme");
    variables.add("id", "0");

    let transport = MockTransport::echo();
    let client = RestingClient::builder("https://api.example.com/")
        .context_path("/api/v1")
        .header_provider(headers.clone())
        .path_variable_provider(variables)
        .transport(transport.clone())
        .build()
        .expect("client");

    const GET_MEMBER: Endpoint<Nothing, Echo> = Endpoint::get("/orgs/{{org}}/members/{{id}}");
    let request = Request::builder(GET_MEMBER, Nothing)
        .path_variable("id", 7)
        .header("X-Tenant", "override")
        .build();

    let echo = client.perform(request).await.expect("echo").into_body();

    check!(echo.url == "https://api.example.com/api/v1/orgs/acme/members/7");
    check!(echo.headers.get("X-Tenant").map(String::as_str) == Some("override"));
    check!(echo.headers.get("X-Request-Id").map(String::as_str) == Some("generated"));
    check!(!echo.headers.contains_key("X-Skipped"));

    // Providers are read per request.
    check!(headers.remove("X-Request-Id"));
    let echo = client
        .perform(Request::builder(GET_MEMBER, Nothing).path_variable("id", 8).build())
        .await
        .expect("echo")
        .into_body();
    check!(!echo.headers.contains_key("X-Request-Id"));
}

#[tokio::test]
async fn request_header_wins_over_provider_with_different_case() {
    let headers = DynamicHeaderProvider::new();
    headers.add("X-Tenant", "default");

    let transport = MockTransport::echo();
    let client = RestingClient::builder("https://api.example.com/")
        .header_provider(headers)
        .transport(transport.clone())
        .build()
        .expect("client");

    const GET_ITEMS: Endpoint<Nothing, Echo> = Endpoint::get("/items");
    let request = Request::builder(GET_ITEMS, Nothing)
        .header("x-tenant", "acme")
        .build();

    let echo = client.perform(request).await.expect("echo").into_body();

    let tenants: Vec<(&str, &str)> = echo
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("x-tenant"))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    check!(tenants == vec![("x-tenant", "acme")]);
}

#[tokio::test]
async fn invalid_path_fails_before_transport() {
    let transport = MockTransport::echo();
    let client = client(&transport);

    const GET_ITEM: Endpoint<Nothing, Echo> = Endpoint::get("/items/{{id}}");
    let err = client
        .perform(Request::empty(GET_ITEM))
        .await
        .expect_err("missing variable");

    check!(matches!(err, Error::InvalidPath(_)));
    check!(transport.seen().is_empty());
}

#[tokio::test]
async fn json_endpoint_sends_body() {
    let transport = MockTransport::echo();
    let client = client(&transport);

    #[derive(Serialize)]
    struct NewItem {
        name: &'static str,
    }
    const CREATE: Endpoint<NewItem, Echo> = Endpoint::post("/items");

    let echo = client
        .perform(Request::new(CREATE, NewItem { name: "pen" }))
        .await
        .expect("echo")
        .into_body();

    check!(echo.body == r#"{"name":"pen"}"#);
    check!(echo.headers.get("Content-Type").map(String::as_str) == Some("application/json"));
    check!(!echo.streamed);
}

// ============================================================================
// Status validation and decoding
// ============================================================================

#[tokio::test]
async fn non_success_statuses_fail_with_http_error() {
    const GET: Endpoint<Nothing, Nothing> = Endpoint::get("/status");

    for status in [100_u16, 199, 300, 301, 304, 400, 401, 404, 418, 500, 503, 599] {
        let transport = MockTransport::status(status, r#"{"error":"nope"}"#);
        let err = client(&transport)
            .perform(Request::empty(GET))
            .await
            .expect_err("non-2xx must fail");

        let_assert!(Error::Http { status: got, headers, body } = err);
        check!(got == status);
        check!(headers.get("x-mock").map(String::as_str) == Some("yes"));
        check!(body.as_ref() == br#"{"error":"nope"}"#);
    }
}

#[tokio::test]
async fn success_statuses_resolve() {
    const GET: Endpoint<Nothing, Nothing> = Endpoint::get("/status");

    for status in [200_u16, 201, 202, 204, 250, 299] {
        let transport = MockTransport::status(status, "{}");
        let response = client(&transport)
            .perform(Request::empty(GET))
            .await
            .expect("2xx must succeed");
        check!(response.status() == status);
    }
}

#[tokio::test]
async fn http_error_body_can_be_decoded() {
    #[derive(Debug, Deserialize)]
    struct ApiError {
        error: String,
    }
    const GET: Endpoint<Nothing, Created> = Endpoint::get("/thing");

    let transport = MockTransport::status(422, r#"{"error":"invalid"}"#);
    let err = client(&transport)
        .perform(Request::empty(GET))
        .await
        .expect_err("422");

    check!(err.is_client_error());
    let_assert!(Some(Ok(api)) = err.decode_body::<ApiError>());
    check!(api.error == "invalid");
}

#[tokio::test]
async fn non_success_with_garbage_body_is_still_http_error() {
    const GET: Endpoint<Nothing, Created> = Endpoint::get("/thing");
    let transport = MockTransport::status(500, "<html>oops</html>");

    let err = client(&transport)
        .perform(Request::empty(GET))
        .await
        .expect_err("500");

    check!(err.status() == Some(500));
    check!(!err.is_decode());
}

#[tokio::test]
async fn optional_response_law() {
    const GET: Endpoint<Nothing, Created> = Endpoint::get("/thing");

    let empty = MockTransport::status(200, "");
    let response = client(&empty)
        .perform_optional(Request::empty(GET))
        .await
        .expect("empty body");
    check!(response.into_body() == None);

    let present = MockTransport::status(200, r#"{"id":9}"#);
    let response = client(&present)
        .perform_optional(Request::empty(GET))
        .await
        .expect("body");
    check!(response.into_body() == Some(Created { id: 9 }));

    let garbage = MockTransport::status(200, "not json");
    let err = client(&garbage)
        .perform_optional(Request::empty(GET))
        .await
        .expect_err("non-empty body is decoded");
    check!(err.is_decode());
}

#[tokio::test]
async fn required_response_decodes_empty_body() {
    const GET: Endpoint<Nothing, Created> = Endpoint::get("/thing");
    let transport = MockTransport::status(200, "");

    let err = client(&transport)
        .perform(Request::empty(GET))
        .await
        .expect_err("empty body cannot decode");

    check!(err.is_decode());
}

#[tokio::test]
async fn empty_response_discards_body() {
    const DELETE: Endpoint<Nothing, Nothing> = Endpoint::delete("/thing");
    let transport = MockTransport::status(204, "ignored, not json");

    let response = client(&transport)
        .perform_empty(Request::empty(DELETE))
        .await
        .expect("no content");

    check!(response.status() == 204);
    check!(response.header("X-Mock") == Some("yes"));
}

#[tokio::test]
async fn transport_failure_propagates() {
    const GET: Endpoint<Nothing, Nothing> = Endpoint::get("/thing");
    let transport = MockTransport::unreachable();

    let err = client(&transport)
        .perform(Request::empty(GET))
        .await
        .expect_err("unreachable");

    check!(err.is_transport());
}

// ============================================================================
// Interceptors
// ============================================================================

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: String) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
}

fn named(log: &Log, name: &'static str) -> impl Interceptor + 'static {
    let log = Arc::clone(log);
    move |request: WireRequest, next: Next| {
        push(&log, format!("enter {name}"));
        let log = Arc::clone(&log);
        next.run(request.with_header(format!("x-{name}"), "1"))
            .peek(move |response| push(&log, format!("observe {name} {}", response.status())))
    }
}

#[tokio::test]
async fn interceptors_run_in_order() {
    let log = Log::default();
    let transport = MockTransport::echo();
    let client = RestingClient::builder("https://api.example.com/")
        .interceptor(named(&log, "a"))
        .interceptor(named(&log, "b"))
        .transport(transport.clone())
        .build()
        .expect("client");

    const GET_X: Endpoint<Nothing, Echo> = Endpoint::get("/x");
    let echo = client
        .perform(Request::empty(GET_X))
        .await
        .expect("echo")
        .into_body();

    check!(
        *log.lock().unwrap_or_else(PoisonError::into_inner)
            == vec!["enter a", "enter b", "observe b 200", "observe a 200"]
    );
    check!(echo.headers.contains_key("x-a"));
    check!(echo.headers.contains_key("x-b"));
}

#[tokio::test]
async fn interceptor_can_short_circuit_and_recover() {
    let transport = MockTransport::unreachable();
    let client = RestingClient::builder("https://api.example.com/")
        .interceptor(|request: WireRequest, next: Next| {
            next.run(request).recover(|err| {
                if err.is_transport() {
                    ProgressFuture::ready(Ok(WireResponse::new(200, HashMap::new(), r#"{"id":1}"#)))
                } else {
                    ProgressFuture::err(err)
                }
            })
        })
        .transport(transport.clone())
        .build()
        .expect("client");

    const GET: Endpoint<Nothing, Created> = Endpoint::get("/cached");
    let created = client
        .perform(Request::empty(GET))
        .await
        .expect("recovered")
        .into_body();

    check!(created == Created { id: 1 });
    check!(transport.seen().len() == 1);
}

// ============================================================================
// Uploads
// ============================================================================

fn avatar(dir: &TempDir) -> FileRef {
    let path = dir.path().join("avatar.png");
    std::fs::write(&path, b"PNGDATA").expect("write avatar");
    FileRef::new(path)
}

#[tokio::test]
async fn upload_streams_staged_multipart_and_cleans_up() {
    let files = tempdir().expect("scratch dir");
    let staging = tempdir().expect("scratch dir");
    let transport = MockTransport::status(201, r#"{"id":5}"#);
    let client = RestingClient::builder("https://api.example.com/")
        .staging_dir(staging.path())
        .transport(transport.clone())
        .build()
        .expect("client");

    const UPLOAD: Endpoint<Profile, Created> = Endpoint::multipart("/profiles");
    let request = Request::new(
        UPLOAD,
        Profile {
            name: "ada".to_string(),
            avatar: avatar(&files),
        },
    );

    let created = client.upload(request).await.expect("upload").into_body();
    check!(created == Created { id: 5 });

    let seen = transport.seen();
    let_assert!([upload] = seen.as_slice());
    check!(upload.request.is_streamed());
    let_assert!(Some((staged_path, staged_text)) = &upload.staged);
    check!(staged_path.parent() == Some(staging.path()));
    check!(staged_text.contains("name=\"name\"\r\n\r\nada\r\n"));
    check!(staged_text.contains("name=\"avatar\"; filename=\"avatar.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n"));

    check!(!staged_path.exists());
    check!(entries(staging.path()).is_empty());
}

#[tokio::test]
async fn staged_file_removed_on_failure() {
    const UPLOAD: Endpoint<Profile, Created> = Endpoint::multipart("/profiles");

    for transport in [MockTransport::status(500, "boom"), MockTransport::unreachable()] {
        let files = tempdir().expect("scratch dir");
        let staging = tempdir().expect("scratch dir");
        let client = RestingClient::builder("https://api.example.com/")
            .staging_dir(staging.path())
            .transport(transport.clone())
            .build()
            .expect("client");

        let request = Request::new(
            UPLOAD,
            Profile {
                name: "ada".to_string(),
                avatar: avatar(&files),
            },
        );

        client.upload(request).await.expect_err("upload fails");

        check!(transport.seen().len() == 1);
        check!(entries(staging.path()).is_empty());
    }
}

#[tokio::test]
async fn dropped_upload_removes_staged_file() {
    const UPLOAD: Endpoint<Profile, Created> = Endpoint::multipart("/profiles");
    let files = tempdir().expect("scratch dir");
    let staging = tempdir().expect("scratch dir");
    let client = RestingClient::builder("https://api.example.com/")
        .staging_dir(staging.path())
        .transport(MockTransport::status(201, r#"{"id":5}"#))
        .build()
        .expect("client");

    let pending = client.upload(Request::new(
        UPLOAD,
        Profile {
            name: "ada".to_string(),
            avatar: avatar(&files),
        },
    ));
    check!(entries(staging.path()).len() == 1);

    drop(pending);
    check!(entries(staging.path()).is_empty());
}

#[tokio::test]
async fn upload_progress_reaches_handlers_before_and_after_map() {
    const UPLOAD: Endpoint<Profile, Created> = Endpoint::multipart("/profiles");
    let files = tempdir().expect("scratch dir");
    let staging = tempdir().expect("scratch dir");
    let client = RestingClient::builder("https://api.example.com/")
        .staging_dir(staging.path())
        .transport(MockTransport::status(201, r#"{"id":5}"#))
        .build()
        .expect("client");

    let events: Arc<Mutex<Vec<(&'static str, u64)>>> = Arc::default();
    let record = |label: &'static str| {
        let events = Arc::clone(&events);
        move |event: ProgressEvent| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((label, event.completed));
        }
    };

    let id = client
        .upload(Request::new(
            UPLOAD,
            Profile {
                name: "ada".to_string(),
                avatar: avatar(&files),
            },
        ))
        .on_progress(record("before"))
        .map(|response| response.into_body().id)
        .on_progress(record("after"))
        .await
        .expect("upload");

    check!(id == 5);
    check!(
        *events.lock().unwrap_or_else(PoisonError::into_inner)
            == vec![
                ("before", 1),
                ("after", 1),
                ("before", 2),
                ("after", 2),
                ("before", 4),
                ("after", 4),
            ]
    );
}

#[tokio::test]
async fn upload_with_json_encoding_stays_in_memory() {
    #[derive(Serialize)]
    struct Note {
        text: &'static str,
    }
    const PUT_NOTE: Endpoint<Note, Echo> = Endpoint::put("/notes/1");

    let transport = MockTransport::echo();
    let echo = client(&transport)
        .upload(Request::new(PUT_NOTE, Note { text: "hi" }))
        .await
        .expect("echo")
        .into_body();

    check!(!echo.streamed);
    check!(echo.body == r#"{"text":"hi"}"#);
}

#[tokio::test]
async fn perform_multipart_is_buffered() {
    const UPLOAD: Endpoint<Profile, Echo> = Endpoint::multipart("/profiles");
    let files = tempdir().expect("scratch dir");
    let transport = MockTransport::echo();

    let echo = client(&transport)
        .perform(Request::new(
            UPLOAD,
            Profile {
                name: "ada".to_string(),
                avatar: avatar(&files),
            },
        ))
        .await
        .expect("echo")
        .into_body();

    check!(!echo.streamed);
    check!(echo.body.contains("PNGDATA"));
    let_assert!(Some(content_type) = echo.headers.get("Content-Type"));
    check!(content_type.starts_with("multipart/form-data; boundary="));
}
