use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use courtfetch_core::artifacts::PdfStore;
use courtfetch_core::fetch::FetchService;
use courtfetch_core::model::{NewQuery, QueryStatus, ScraperResult};
use courtfetch_core::scrapers::{Scraper, ScraperRegistry};
use courtfetch_core::storage::store::Store;
use courtfetch_server::config::ServerConfig;
use courtfetch_server::web::{build_app, AppState};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn config(dir: &Path) -> ServerConfig {
    ServerConfig {
        db_path: dir.join("cases.db"),
        pdf_dir: dir.join("pdfs"),
        ..ServerConfig::default()
    }
}

fn app(dir: &Path) -> Router {
    let state = courtfetch_server::open_state(&config(dir)).unwrap();
    build_app(state)
}

async fn body_bytes(res: Response) -> Vec<u8> {
    to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn json_from(res: Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        req = req.header(COOKIE, c);
    }
    app.clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// `name=value` part of the Set-Cookie header, ready to send back.
fn flash_cookie(res: &Response) -> String {
    let set = res.headers()[SET_COOKIE].to_str().unwrap();
    set.split(';').next().unwrap().to_string()
}

async fn flashes_after(app: &Router, res: &Response) -> String {
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[LOCATION], "/");
    let page = get(app, "/", Some(&flash_cookie(res))).await;
    assert_eq!(page.status(), StatusCode::OK);
    String::from_utf8(body_bytes(page).await).unwrap()
}

fn row_count(dir: &Path) -> i64 {
    let conn = rusqlite::Connection::open(dir.join("cases.db")).unwrap();
    conn.query_row("SELECT count(*) FROM query_log", [], |r| r.get(0))
        .unwrap()
}

#[tokio::test]
async fn fetch_list_and_download_roundtrip() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let res = post_form(
        &app,
        "/fetch",
        "court=dummy_court_example&case_type=CRL&case_number=123&year=2024",
    )
    .await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Fetched successfully!"));
    assert!(page.contains("<h3>CRL-123/2024</h3>"));
    assert!(page.contains(r#"href="/download/1""#));

    let list = json_from(get(&app, "/api/queries", None).await).await;
    let rows = list["queries"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "ok");
    assert_eq!(rows[0]["has_pdf"], true);
    assert_eq!(
        rows[0]["parsed"]["parties"],
        serde_json::json!({"petitioner": "A. Example", "respondent": "B. Sample"})
    );
    assert_eq!(rows[0]["parsed"]["filing_date"], "2021-06-15");
    assert_eq!(rows[0]["parsed"]["next_hearing"], "2025-10-10");

    let res = get(&app, "/download/1", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/pdf");
    let disposition = res.headers()[CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\""));
    assert!(disposition.ends_with("_CRL_123_2024.pdf\""));

    let downloaded = body_bytes(res).await;
    let store = Store::open(&dir.path().join("cases.db")).unwrap();
    let stored_path = store.get(1).unwrap().unwrap().pdf_path.unwrap();
    assert_eq!(downloaded, std::fs::read(stored_path).unwrap());
    assert!(downloaded.starts_with(b"%PDF"));
}

#[tokio::test]
async fn index_consumes_flash() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let res = post_form(&app, "/fetch", "court=nowhere&case_type=CRL&case_number=1").await;
    let cookie = flash_cookie(&res);
    let page = get(&app, "/", Some(&cookie)).await;
    let cleared = page.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.contains("Max-Age=0"));

    let plain = get(&app, "/", None).await;
    assert!(plain.headers().get(SET_COOKIE).is_none());
    let html = String::from_utf8(body_bytes(plain).await).unwrap();
    assert!(!html.contains("class=\"flash\""));
}

#[tokio::test]
async fn unknown_court_creates_no_row() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let res = post_form(&app, "/fetch", "court=nowhere&case_type=CRL&case_number=1").await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Unknown court"));
    assert_eq!(row_count(dir.path()), 0);
}

#[tokio::test]
async fn missing_fields_create_no_row() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    for form in [
        "case_type=CRL&case_number=1",
        "court=dummy_court_example&case_type=&case_number=1",
        "court=dummy_court_example&case_type=CRL",
        "",
    ] {
        let res = post_form(&app, "/fetch", form).await;
        let page = flashes_after(&app, &res).await;
        assert!(page.contains("Missing required fields"), "form: {form}");
    }
    assert_eq!(row_count(dir.path()), 0);
}

#[tokio::test]
async fn undecodable_fetch_body_flashes_missing_fields() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let res = post_form(
        &app,
        "/fetch",
        "court=a&court=b&case_type=CRL&case_number=1",
    )
    .await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Missing required fields"));

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/fetch")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"court":"dummy_court_example"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Missing required fields"));

    assert_eq!(row_count(dir.path()), 0);
}

#[tokio::test]
async fn download_without_file_redirects() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    // nonexistent id
    let res = get(&app, "/download/99", None).await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("PDF not available"));

    // row without pdf_path
    let store = Store::open(&dir.path().join("cases.db")).unwrap();
    let id = store
        .insert_pending(&NewQuery {
            court: "dummy_court_example".into(),
            case_type: "CRL".into(),
            case_number: "1".into(),
            year: None,
        })
        .unwrap();
    store.mark_error(id, "boom").unwrap();
    let res = get(&app, &format!("/download/{id}"), None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    // file removed after the fact
    post_form(
        &app,
        "/fetch",
        "court=dummy_court_example&case_type=CRL&case_number=2",
    )
    .await;
    let path = store.get(id + 1).unwrap().unwrap().pdf_path.unwrap();
    std::fs::remove_file(path).unwrap();
    let res = get(&app, &format!("/download/{}", id + 1), None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(body_bytes(res).await.is_empty());
}

#[tokio::test]
async fn listing_is_capped_and_newest_first() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let store = Store::open(&dir.path().join("cases.db")).unwrap();
    for i in 0..55 {
        store
            .insert_pending(&NewQuery {
                court: "dummy_court_example".into(),
                case_type: "CRL".into(),
                case_number: i.to_string(),
                year: None,
            })
            .unwrap();
    }

    let list = json_from(get(&app, "/api/queries", None).await).await;
    let rows = list["queries"].as_array().unwrap();
    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0]["case_number"], "54");
    assert_eq!(rows[49]["case_number"], "5");

    let list = json_from(get(&app, "/api/queries?limit=3", None).await).await;
    assert_eq!(list["queries"].as_array().unwrap().len(), 3);

    let html = String::from_utf8(body_bytes(get(&app, "/", None).await).await).unwrap();
    assert_eq!(html.matches("<div class=\"card\">").count(), 50);
}

struct BrokenScraper;

#[async_trait]
impl Scraper for BrokenScraper {
    fn court(&self) -> &'static str {
        "broken_court"
    }

    async fn fetch(
        &self,
        _case_type: &str,
        _case_number: &str,
        _year: Option<&str>,
    ) -> anyhow::Result<ScraperResult> {
        anyhow::bail!("court site layout changed")
    }
}

#[tokio::test]
async fn scraper_error_is_logged_and_flashed() {
    let dir = tempdir().unwrap();
    let store = Store::open(&dir.path().join("cases.db")).unwrap();
    store.init_schema().unwrap();
    let mut registry = ScraperRegistry::with_builtin();
    registry.register(Arc::new(BrokenScraper));
    let service = FetchService::new(
        store.clone(),
        Arc::new(registry),
        PdfStore::open(dir.path().join("pdfs")).unwrap(),
    );
    let app = build_app(AppState::new(service, 50));

    let res = post_form(&app, "/fetch", "court=broken_court&case_type=OS&case_number=4").await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Error: court site layout changed"));
    assert!(page.contains(r#"<option value="broken_court">"#));

    let row = store.get(1).unwrap().unwrap();
    assert_eq!(row.status, QueryStatus::Error);
    assert_eq!(row.raw_response.as_deref(), Some("court site layout changed"));
    assert!(row.pdf_path.is_none());
}

#[tokio::test]
async fn restart_marks_in_flight_rows_interrupted() {
    let dir = tempdir().unwrap();
    {
        let store = Store::open(&dir.path().join("cases.db")).unwrap();
        store.init_schema().unwrap();
        store
            .insert_pending(&NewQuery {
                court: "dummy_court_example".into(),
                case_type: "CRL".into(),
                case_number: "1".into(),
                year: None,
            })
            .unwrap();
    }

    let app = app(dir.path());
    let list = json_from(get(&app, "/api/queries", None).await).await;
    assert_eq!(list["queries"][0]["status"], "interrupted");
}

#[tokio::test]
async fn cause_list_and_health() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let res = post_form(&app, "/causelist", "court=dummy_court_example&date=").await;
    let page = flashes_after(&app, &res).await;
    assert!(page.contains("Cause list download is not available for dummy_court_example"));

    let health = json_from(get(&app, "/health", None).await).await;
    assert_eq!(health["ok"], true);
    assert_eq!(health["courts"][0], "dummy_court_example");
}
