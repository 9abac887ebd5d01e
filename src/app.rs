use crate::BoxError;
use crate::form::PredictionForm;
use crate::model::Predictor;
use crate::notify::Notifier;
use crate::record::PredictionRecord;
use crate::recorder::Recorder;
use crate::subscribers::SubscriberStore;
use axum::{
    Form, Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared application state, constructed once in `main` and held for the
/// process lifetime.
pub struct AppState {
    pub predictor: Predictor,
    pub recorder: tokio::sync::Mutex<Recorder>,
    pub notifier: Option<Notifier>,
    pub subscribers: Arc<SubscriberStore>,
}

#[derive(Serialize)]
struct PredictResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicted_nni: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_form))
        .route("/api/predict", post(predict))
        .with_state(state)
}

/// Start the web application.
pub async fn run(addr: &str, state: Arc<AppState>) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn serve_form() -> Html<&'static str> {
    Html(include_str!("./static/form.html"))
}

/// Handle one form submission: validate, predict, persist, notify.
///
/// Validation failure aborts before any side effect. Persistence and
/// notification failures are downgraded to warnings so the prediction
/// already computed is still returned to the user.
async fn predict(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PredictionForm>,
) -> Json<PredictResponse> {
    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(message) => {
            return Json(PredictResponse {
                status: "invalid".to_string(),
                predicted_nni: None,
                message: Some(message),
                warnings: Vec::new(),
            });
        }
    };

    let prediction = state.predictor.predict(submission.features());
    let record = PredictionRecord::build(&submission, prediction, Local::now());

    // Serialize the read-modify-write cycle across concurrent submissions
    let mut warnings = {
        let recorder = state.recorder.lock().await;
        recorder.append(&record).await
    };
    if let Some(notifier) = &state.notifier {
        let recipients = state.subscribers.all();
        if !recipients.is_empty() {
            let text = format!(
                "New NNI prediction by {}\nGrade: {}\nPredicted NNI = {:.2}",
                record.user_name, record.polymer_grade, record.predicted_nni
            );
            let report = notifier.broadcast(&recipients, &text).await;
            if report.failed > 0 {
                warnings.push(format!(
                    "Notification delivered to {} of {} subscribers.",
                    report.delivered,
                    report.delivered + report.failed
                ));
            }
        }
    }

    Json(PredictResponse {
        status: "ok".to_string(),
        predicted_nni: Some(prediction),
        message: Some(format!("Predicted NNI = {:.2}", prediction)),
        warnings,
    })
}
