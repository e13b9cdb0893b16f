//! HTTP tests for the map endpoints, using the mock tool runner.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;
use reliefmap_core::StageId;

fn usa_body() -> serde_json::Value {
    json!({
        "countries": [{"code": "USA", "continent": "North America", "name": "United States of America"}],
        "continents": [],
        "north": 50,
        "south": 30,
        "west": -130,
        "east": -60
    })
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_reports_paths() {
    let fixture = TestFixture::new();
    let response = fixture.get("/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pipeline"]["max_concurrent_runs"], 2);
    assert_eq!(response.body["render"]["hillshade"]["mode"], "illumination");
    assert_eq!(
        response.body["paths"]["public_dir"],
        fixture.config.paths.public_dir.to_string_lossy().as_ref()
    );
}

#[tokio::test]
async fn test_list_countries() {
    let fixture = TestFixture::new();
    let response = fixture.get("/maps/countries").await;

    assert_eq!(response.status, StatusCode::OK);
    let countries = response.body.as_array().unwrap();
    assert_eq!(countries.len(), 6);
    assert_eq!(
        countries[0],
        json!({"name": "Canada", "code": "CAN", "continent": "North America"})
    );
}

#[tokio::test]
async fn test_generate_usa_map() {
    let fixture = TestFixture::new();
    let response = fixture.post("/maps/countries", usa_body()).await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    let body = &response.body;
    assert!(body["run_id"].as_str().is_some());
    assert_eq!(body["window"], "50_-130_-60_30");
    assert!(body["image"]
        .as_str()
        .unwrap()
        .ends_with("50_-130_-60_30.webp"));
    assert!(body["topo"]
        .as_str()
        .unwrap()
        .ends_with("50_-130_-60_30_countries.topo.json"));
    assert!(body["rivers"]
        .as_str()
        .unwrap()
        .ends_with("50_-130_-60_30_rivers.topo.json"));
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with(fixture.config.paths.workspace_root.to_string_lossy().as_ref()));
    assert_eq!(body["stages"].as_array().unwrap().len(), 15);
    assert_eq!(body["stages"][14]["stage"], "publish");

    assert!(fixture
        .config
        .paths
        .public_dir
        .join("50_-130_-60_30.webp")
        .exists());
}

#[tokio::test]
async fn test_generate_accepts_string_coordinates() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/maps/countries",
            json!({
                "countries": [],
                "continents": [{"continent": "Europe"}],
                "north": "55", "south": "40", "west": "-5", "east": "10"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    let invocations = fixture.runner.recorded_invocations().await;
    assert_eq!(invocations[0].args[1], "adm0_a3 IN ('FRA')");
}

#[tokio::test]
async fn test_stage_failure_returns_500_with_stage() {
    let fixture = TestFixture::new();
    fixture
        .runner
        .fail_stage(StageId::ReprojectElevation, 1)
        .await;

    let response = fixture.post("/maps/countries", usa_body()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["stage"], "reproject_elevation");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("gdalwarp exited with code 1"));
    assert_eq!(fixture.runner.invocation_count().await, 7);
}

#[tokio::test]
async fn test_empty_selection_returns_400() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/maps/countries",
            json!({"countries": [], "continents": [], "north": 50, "south": 30, "west": -130, "east": -60}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().is_some());
    assert!(response.body.get("stage").is_none());
    assert_eq!(fixture.runner.invocation_count().await, 0);
}

#[tokio::test]
async fn test_injected_code_returns_400() {
    let fixture = TestFixture::new();
    let mut body = usa_body();
    body["countries"] = json!([{"code": "USA') OR 1=1 --"}]);

    let response = fixture.post("/maps/countries", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.runner.invocation_count().await, 0);
}

#[tokio::test]
async fn test_inverted_window_returns_400() {
    let fixture = TestFixture::new();
    let mut body = usa_body();
    body["north"] = json!(10);

    let response = fixture.post("/maps/countries", body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let fixture = TestFixture::new();
    let response = fixture.post_raw("/maps/countries", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_latest_topology() {
    let fixture = TestFixture::new();

    let before = fixture.get("/maps/topo.json").await;
    assert_eq!(before.status, StatusCode::NOT_FOUND);

    let generated = fixture.post("/maps/countries", usa_body()).await;
    assert_eq!(generated.status, StatusCode::OK);

    let after = fixture.get("/maps/topo.json").await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["type"], "Topology");
    assert_eq!(
        after.body["objects"]["countries"]["geometries"][0]["properties"]["sov"],
        "US1"
    );
}

#[tokio::test]
async fn test_latest_topology_survives_failed_rerun() {
    let fixture = TestFixture::new();
    let generated = fixture.post("/maps/countries", usa_body()).await;
    assert_eq!(generated.status, StatusCode::OK);

    fixture
        .runner
        .fail_stage(StageId::ReprojectElevation, 1)
        .await;
    let failed = fixture.post("/maps/countries", usa_body()).await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);

    let topo = fixture.get("/maps/topo.json").await;
    assert_eq!(topo.status, StatusCode::OK);
    assert_eq!(topo.body["type"], "Topology");
}

#[tokio::test]
async fn test_list_countries_by_continent() {
    let fixture = TestFixture::new();
    let response = fixture.get("/maps/countries?order=continent").await;

    assert_eq!(response.status, StatusCode::OK);
    let codes: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["FRA", "JPN", "CAN", "MEX", "USA", "BRA"]);
}

#[tokio::test]
async fn test_list_continents() {
    let fixture = TestFixture::new();
    let response = fixture.get("/maps/continents").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!(["Europe", "Asia", "North America", "South America"])
    );
}

#[tokio::test]
async fn test_status_counts_runs() {
    let fixture = TestFixture::new();
    fixture.post("/maps/countries", usa_body()).await;

    let status = fixture.get("/maps/status").await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["total_succeeded"], 1);
    assert_eq!(status.body["active_runs"], json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("reliefmap_http_requests_total"));
    assert!(body.contains("reliefmap_pipeline_capacity"));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let fixture = TestFixture::new();
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
