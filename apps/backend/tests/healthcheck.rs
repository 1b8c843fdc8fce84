mod support;

use actix_web::test;
use support::create_test_app;
use support::state::build_test_state;

#[actix_web::test]
async fn test_health_endpoint() {
    let app = create_test_app(build_test_state())
        .with_prod_routes()
        .build()
        .await
        .unwrap();

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    // No database is wired in this configuration; the endpoint says so
    // instead of failing.
    assert_eq!(body["db"], "disabled");
    assert!(body["app_version"].is_string());
}

#[actix_web::test]
async fn health_needs_no_credentials() {
    let app = create_test_app(build_test_state())
        .with_prod_routes()
        .build()
        .await
        .unwrap();

    // Root and health are both reachable without an Authorization header.
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status().as_u16(), 200);
}
