use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sales_predictor::{build_router, LocalArtifactStore, ServerConfig, ServingContext};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const INTERCEPT: f64 = 20000.0;
const COEFFICIENTS: [f64; 7] = [10.0, 500.0, -250.0, 100.0, 300.0, 50.0, 2.0];

fn write_artifacts(dir: &TempDir) {
    let files = [
        ("le_gender.json", json!({"field": "gender", "classes": ["F", "M"]})),
        ("le_marital.json", json!({"field": "maritalStatus", "classes": ["Married", "Single"]})),
        (
            "le_state.json",
            json!({"field": "state", "classes": ["Delhi", "Haryana", "Karnataka", "Maharashtra", "Uttar Pradesh"]}),
        ),
        (
            "le_category.json",
            json!({"field": "productCategory", "classes": ["Clothing", "Electronics", "Food", "Home"]}),
        ),
        (
            "le_age_group.json",
            json!({"field": "ageGroup", "classes": ["18-25", "26-35", "36-45", "46-55", "56-70"]}),
        ),
        (
            "model.json",
            json!({
                "kind": "linear",
                "feature_names": ["Age", "Gender", "Marital_Status", "State", "Product_Category", "Age_Group", "Orders"],
                "intercept": INTERCEPT,
                "coefficients": COEFFICIENTS,
            }),
        ),
    ];
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content.to_string()).unwrap();
    }
}

async fn test_app_with(sales_csv: Option<&str>) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);

    let mut config = ServerConfig::default();
    config.artifacts.dir = dir.path().to_string_lossy().to_string();
    if let Some(csv) = sales_csv {
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, csv).unwrap();
        config.data.sales_csv = Some(path.to_string_lossy().to_string());
    }

    let store = LocalArtifactStore::new(dir.path());
    let context = ServingContext::load(&store, &config).await.unwrap();
    (build_router(Arc::new(context), true), dir)
}

async fn test_app() -> (Router, TempDir) {
    test_app_with(None).await
}

fn valid_body() -> Value {
    json!({
        "age": 30,
        "gender": "Male",
        "maritalStatus": "Single",
        "state": "Delhi",
        "productCategory": "Electronics",
        "ageGroup": "26-35",
        "orders": 5
    })
}

async fn post_predict(app: &Router, body: &Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn expected_prediction(features: [f64; 7]) -> f64 {
    INTERCEPT
        + COEFFICIENTS
            .iter()
            .zip(features.iter())
            .map(|(c, x)| c * x)
            .sum::<f64>()
}

#[tokio::test]
async fn test_end_to_end_prediction() {
    let (app, _dir) = test_app().await;

    let (status, json) = post_predict(&app, &valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    // Male→M=1, Single=1, Delhi=0, Electronics=1, 26-35=1
    let expected = expected_prediction([30.0, 1.0, 1.0, 0.0, 1.0, 1.0, 5.0]);
    assert_eq!(json["prediction"].as_f64().unwrap(), expected);
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_male_and_m_predict_identically() {
    let (app, _dir) = test_app().await;

    let (_, long) = post_predict(&app, &valid_body()).await;
    let mut short_body = valid_body();
    short_body["gender"] = json!("M");
    let (status, short) = post_predict(&app, &short_body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(long, short);
}

#[tokio::test]
async fn test_missing_fields_named() {
    let (app, _dir) = test_app().await;

    let mut body = valid_body();
    body.as_object_mut().unwrap().remove("ageGroup");
    body.as_object_mut().unwrap().remove("age");

    let (status, json) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required fields: age, ageGroup");
}

#[tokio::test]
async fn test_empty_object_names_every_field() {
    let (app, _dir) = test_app().await;
    let (status, json) = post_predict(&app, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Missing required fields: age, gender, maritalStatus, state, productCategory, ageGroup, orders"
    );
}

#[tokio::test]
async fn test_non_numeric_orders() {
    let (app, _dir) = test_app().await;
    let mut body = valid_body();
    body["orders"] = json!("many");

    let (status, json) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("orders"));
    assert!(message.contains("not numeric"));
}

#[tokio::test]
async fn test_age_outside_age_group() {
    let (app, _dir) = test_app().await;
    for (age, group) in [(25, "26-35"), (40, "18-25"), (71, "56-70"), (55, "56-70")] {
        let mut body = valid_body();
        body["age"] = json!(age);
        body["ageGroup"] = json!(group);

        let (status, json) = post_predict(&app, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "age {age} in {group}");
        assert!(json["error"].as_str().unwrap().contains("does not match ageGroup"));
    }
}

#[tokio::test]
async fn test_minor_married_rejected() {
    let (app, _dir) = test_app().await;
    let mut body = valid_body();
    body["age"] = json!(16);
    body["maritalStatus"] = json!("Married");
    body["ageGroup"] = json!("18-25");

    let (status, json) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Married not allowed for age < 18"));
}

#[tokio::test]
async fn test_unknown_state_lists_vocabulary() {
    let (app, _dir) = test_app().await;
    let mut body = valid_body();
    body["state"] = json!("Unknown State");

    let (status, json) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("state"));
    for state in ["Delhi", "Haryana", "Karnataka", "Maharashtra", "Uttar Pradesh"] {
        assert!(message.contains(state), "{state} missing from {message}");
    }
}

#[tokio::test]
async fn test_unknown_product_category() {
    let (app, _dir) = test_app().await;
    let mut body = valid_body();
    body["productCategory"] = json!("Toys");

    let (status, json) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("productCategory"));
}

#[tokio::test]
async fn test_extra_fields_ignored() {
    let (app, _dir) = test_app().await;
    let mut body = valid_body();
    body["festival"] = json!("Diwali");

    let (status, _) = post_predict(&app, &body).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _dir) = test_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from("{\"age\": 30,"))
        .unwrap();

    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_non_object_body_is_bad_request() {
    let (app, _dir) = test_app().await;
    let (status, json) = post_predict(&app, &json!([1, 2, 3])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("JSON object"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app().await;
    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "linear");
    assert_eq!(json["features"].as_array().unwrap().len(), 7);
    assert_eq!(json["insights"], false);
}

#[tokio::test]
async fn test_encoders_endpoint() {
    let (app, _dir) = test_app().await;
    let (status, json) = get(&app, "/encoders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["gender"], json!(["F", "M"]));
    assert_eq!(json["ageGroup"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_insights_not_configured() {
    let (app, _dir) = test_app().await;
    let (status, json) = get(&app, "/insights").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_insights_from_sales_csv() {
    let csv = "\
age,gender,maritalStatus,state,productCategory,ageGroup,orders,sales
30,M,Single,Delhi,Electronics,26-35,5,100.0
22,F,Married,Haryana,Food,18-25,3,50.0
";
    let (app, _dir) = test_app_with(Some(csv)).await;
    let (status, json) = get(&app, "/insights").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["records"], 2);
    assert_eq!(json["total_sales"], 150.0);
    assert_eq!(json["sales_by_state"][0]["label"], "Delhi");
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let (app, _dir) = test_app().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
