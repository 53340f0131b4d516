//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use car_inventory_core::{
    ApiError, BulkOwnerUpdate, Car, CarDraft, HttpMethod, HttpRequest, HttpResponse, InventoryClient, UpdateDraft,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3001";

fn client() -> InventoryClient {
    InventoryClient::new(BASE_URL)
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Check method, path, and (when present in the vector) headers and JSON body.
fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(
        req.path,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: path"
    );

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn check_error(name: &str, err: ApiError, expected: &Value) {
    match expected.as_str().unwrap() {
        "NotFound" => assert!(matches!(err, ApiError::NotFound), "{name}: expected NotFound, got {err:?}"),
        "HttpError" => assert!(
            matches!(err, ApiError::HttpError { .. }),
            "{name}: expected HttpError, got {err:?}"
        ),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_list_cars();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_list_cars(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<Car> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[test]
fn add_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/add.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CarDraft = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_add_car(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let created = c.parse_add_car(simulated(&case)).unwrap();
        let expected: Option<Car> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(created, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Find older than
// ---------------------------------------------------------------------------

#[test]
fn find_older_than_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/find.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CarDraft = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_find_older_than(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_find_older_than(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<Car> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Update one
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/update.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();
        let input: UpdateDraft = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_update_by_id(id, &input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_by_id(simulated(&case));
        match case.get("expected_error") {
            Some(expected_error) => check_error(name, result.unwrap_err(), expected_error),
            None => assert!(result.is_ok(), "{name}: expected success"),
        }
    }
}

// ---------------------------------------------------------------------------
// Update many
// ---------------------------------------------------------------------------

#[test]
fn update_many_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/update_many.json")) {
        let name = case["name"].as_str().unwrap();
        let input: BulkOwnerUpdate = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_update_many(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_many(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<Car> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

#[test]
fn remove_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/remove.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_remove_by_id(id);
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_remove_by_id(simulated(&case));
        match case.get("expected_error") {
            Some(expected_error) => check_error(name, result.unwrap_err(), expected_error),
            None => assert!(result.is_ok(), "{name}: expected success"),
        }
    }
}
