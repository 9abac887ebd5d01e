use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use nni_predictor::app::{self, AppState};
use nni_predictor::model::Predictor;
use nni_predictor::recorder::Recorder;
use nni_predictor::saving::CsvStore;
use nni_predictor::subscribers::SubscriberStore;
use std::path::Path;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_state(dir: &Path) -> Arc<AppState> {
    // Identity scaler, so the expected prediction is easy to compute by hand
    let predictor = Predictor::from_params(
        vec![0.0; 4],
        vec![1.0; 4],
        1.5,
        vec![1.0, 2.0, 3.0, 4.0],
    )
    .unwrap();

    let recorder = Recorder::new(None, Some(CsvStore::new(dir.join("predictions.csv"))), None);
    let subscribers = Arc::new(SubscriberStore::load(dir.join("subscribers.txt")).unwrap());

    Arc::new(AppState {
        predictor,
        recorder: tokio::sync::Mutex::new(recorder),
        notifier: None,
        subscribers,
    })
}

async fn post_form(state: Arc<AppState>, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app::router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn valid_body(user: &str) -> String {
    format!(
        "date=2024-05-01&time=08%3A30&polymer_grade=HD7000F&user_name={}&input_a=120&input_b=7.5&input_c=0.35&input_d=2.1",
        user
    )
}

#[tokio::test]
async fn valid_submission_appends_one_record_with_model_output() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let (status, json) = post_form(Arc::clone(&state), &valid_body("tester")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    // intercept 1.5 + 120*1 + 7.5*2 + 0.35*3 + 2.1*4
    let expected = 1.5 + 120.0 + 15.0 + 1.05 + 8.4;
    let predicted = json["predicted_nni"].as_f64().unwrap();
    assert!((predicted - expected).abs() < 1e-9);

    let table = CsvStore::new(dir.path().join("predictions.csv"))
        .read_table()
        .unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.rows[0][2], "tester");
    assert_eq!(table.rows[0][8], format!("{:.2}", expected));
}

#[tokio::test]
async fn missing_text_field_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let body =
        "date=2024-05-01&polymer_grade=&user_name=tester&input_a=120&input_b=7.5&input_c=0.35&input_d=2.1";
    let (status, json) = post_form(state, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "invalid");
    assert!(json.get("predicted_nni").is_none());

    // No backend write occurred
    assert!(!dir.path().join("predictions.csv").exists());
}

#[tokio::test]
async fn missing_numeric_field_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let body =
        "date=2024-05-01&polymer_grade=HD7000F&user_name=tester&input_a=120&input_b=&input_c=0.35&input_d=2.1";
    let (_, json) = post_form(state, body).await;
    assert_eq!(json["status"], "invalid");
    assert!(!dir.path().join("predictions.csv").exists());
}

#[tokio::test]
async fn sequential_submissions_accumulate_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    for user in ["first", "second", "third"] {
        let (_, json) = post_form(Arc::clone(&state), &valid_body(user)).await;
        assert_eq!(json["status"], "ok");
    }

    let table = CsvStore::new(dir.path().join("predictions.csv"))
        .read_table()
        .unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[0][2], "first");
    assert_eq!(table.rows[1][2], "second");
    assert_eq!(table.rows[2][2], "third");
}

#[tokio::test]
async fn form_page_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let response = app::router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("NNI Predictor"));
    assert!(page.contains("/api/predict"));
}
