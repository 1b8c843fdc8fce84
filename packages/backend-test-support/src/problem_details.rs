//! Problem-details assertions for backend tests
//!
//! Validates responses against the stable error contract without depending
//! on backend types.

use actix_web::http::StatusCode;
use serde::Deserialize;

/// Mirrors the backend's problem-details body shape.
#[derive(Debug, Deserialize)]
struct ProblemDetailsLike {
    #[serde(rename = "type")]
    type_: String,
    title: String,
    status: u16,
    detail: String,
    code: String,
    trace_id: String,
}

/// Assert that a `ServiceResponse` conforms to the stable error contract:
/// expected HTTP status, an `x-trace-id` header matching the body
/// `trace_id`, and the expected `code` (plus an optional detail substring).
pub async fn assert_problem_details_from_service_response(
    resp: actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail_contains: Option<&str>,
) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = actix_web::test::read_body(resp).await;

    assert_problem_details_from_parts(
        status,
        &headers,
        &body,
        expected_code,
        expected_status,
        expected_detail_contains,
    )
    .await;
}

/// Assert the error contract from raw response parts.
pub async fn assert_problem_details_from_parts(
    status: StatusCode,
    headers: &actix_web::http::header::HeaderMap,
    body_bytes: &[u8],
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail_contains: Option<&str>,
) {
    assert_eq!(status, expected_status);

    let body_str =
        String::from_utf8(body_bytes.to_vec()).expect("response body should be valid UTF-8");
    let problem: ProblemDetailsLike =
        serde_json::from_str(&body_str).expect("response body should be problem-details JSON");

    // trace_id parity: body trace_id equals the x-trace-id header
    let trace_id_header = headers
        .get("x-trace-id")
        .expect("x-trace-id header should be present")
        .to_str()
        .expect("x-trace-id header should be valid UTF-8");

    assert_eq!(
        problem.trace_id, trace_id_header,
        "trace_id in body should match x-trace-id header"
    );

    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());
    assert!(!problem.title.is_empty());
    assert!(problem.type_.ends_with(&format!("/errors/{}", problem.code)));

    if let Some(expected_detail) = expected_detail_contains {
        assert!(
            problem.detail.contains(expected_detail),
            "expected detail to contain '{}', got '{}'",
            expected_detail,
            problem.detail
        );
    }
}
