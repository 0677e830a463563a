//! HTTP integration tests
//!
//! Drives the `/mcp` routes end to end with `actix_web::test`, chaining
//! tool calls the way a client would: edit a workbook, then read the
//! returned file back.

mod support;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sheetbox::datauri;
use sheetbox::server::{configure, json_config};
use sheetbox::ToolSystem;
use support::{dated_workbook, sales_workbook, WorkbookBuilder, XLSX_MIME};

macro_rules! service {
    ($limit:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(ToolSystem::new()))
                .app_data(json_config($limit))
                .configure(configure),
        )
        .await
    };
}

macro_rules! run_request {
    ($tool_id:expr, $parameters:expr $(,)?) => {
        test::TestRequest::post()
            .uri("/mcp/run")
            .set_json(json!({"tool_id": $tool_id, "parameters": $parameters}))
            .to_request()
    };
}

fn sales() -> String {
    datauri::encode(XLSX_MIME, &sales_workbook().build())
}

#[actix_web::test]
async fn test_info_describes_parameters() {
    let app = service!(1024 * 1024);
    let req = test::TestRequest::get().uri("/mcp/info").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["name"], "MS Excel Tools");
    assert!(body["description"].as_str().unwrap().contains("Excel"));

    let set_cell = &body["tools"][3];
    assert_eq!(set_cell["id"], "set_cell");
    let params: Vec<(&str, &str)> = set_cell["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["name"].as_str().unwrap(), p["type"].as_str().unwrap()))
        .collect();
    assert_eq!(
        params,
        vec![("file", "file"), ("cell", "string"), ("value", "string")]
    );
}

#[actix_web::test]
async fn test_edit_then_read_back() {
    let app = service!(1024 * 1024);

    let body: Value = test::call_and_read_body_json(
        &app,
        run_request!(
            "set_cell",
            json!({"file": sales(), "cell": "Sales!C2", "value": "42"}),
        ),
    )
    .await;
    let file = body["result"]["file"].as_str().unwrap().to_string();
    assert!(file.starts_with(&format!("data:{};base64,", XLSX_MIME)));

    let body: Value = test::call_and_read_body_json(
        &app,
        run_request!("get_cell", json!({"file": file, "cell": "Sales!C2"})),
    )
    .await;
    assert_eq!(body, json!({"result": {"value": 42}}));

    let body: Value = test::call_and_read_body_json(
        &app,
        run_request!("sum_range", json!({"file": file, "range": "Sales!B2:C3"})),
    )
    .await;
    assert_eq!(body, json!({"result": {"value": 242.5}}));
}

#[actix_web::test]
async fn test_csv_export() {
    let app = service!(1024 * 1024);
    let body: Value =
        test::call_and_read_body_json(&app, run_request!("to_csv", json!({"file": sales()}))).await;

    let file = body["result"]["file"].as_str().unwrap();
    assert!(file.starts_with("data:text/csv;base64,"));
    let csv = String::from_utf8(datauri::decode(file).unwrap()).unwrap();
    assert!(csv.starts_with("Region,Revenue\r\nNorth,120\r\n"));
}

#[actix_web::test]
async fn test_unknown_sheet_is_400() {
    let app = service!(1024 * 1024);
    let resp = test::call_service(
        &app,
        run_request!("avg_range", json!({"file": sales(), "range": "Q4!A1:A3"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Worksheet Q4 does not exist."}));
}

#[actix_web::test]
async fn test_corrupt_file_is_400() {
    let app = service!(1024 * 1024);
    let resp = test::call_service(
        &app,
        run_request!(
            "get_cell",
            json!({"file": "data:x;base64,bm90IGEgemlw", "cell": "Sales!A1"}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse Excel file"));
}

#[actix_web::test]
async fn test_workbook_over_limit_is_413() {
    let app = service!(512);
    let resp = test::call_service(&app, run_request!("to_csv", json!({"file": sales()}))).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_wide_sheet_export_is_400() {
    let app = service!(1024 * 1024);
    let book = WorkbookBuilder::new()
        .sheet("Wide", r#"<row r="2000"><c r="XFD2000"><v>1</v></c></row>"#)
        .build();

    let resp = test::call_service(
        &app,
        run_request!("to_csv", json!({"file": datauri::encode(XLSX_MIME, &book)})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Workbook too large"));
}

#[actix_web::test]
async fn test_dates_in_results() {
    let app = service!(1024 * 1024);
    let file = datauri::encode(XLSX_MIME, &dated_workbook().build());

    let body: Value = test::call_and_read_body_json(
        &app,
        run_request!("get_cell", json!({"file": file, "cell": "Log!A2"})),
    )
    .await;
    assert_eq!(body, json!({"result": {"value": "2024-01-15T18:00:00"}}));
}

#[actix_web::test]
async fn test_wrong_method() {
    let app = service!(1024);
    let req = test::TestRequest::get().uri("/mcp/run").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}
