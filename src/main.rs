use nni_predictor::app::{self, AppState};
use nni_predictor::config::AppConfig;
use nni_predictor::model::Predictor;
use nni_predictor::notify::Notifier;
use nni_predictor::recorder::Recorder;
use nni_predictor::saving::{CsvStore, GitSync};
use nni_predictor::sheet::SheetClient;
use nni_predictor::subscribers::SubscriberStore;
use nni_predictor::webhook::{self, WebhookState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let config = AppConfig::load()?;
    let predictor = Predictor::from_file(&config.model_path)?;
    let subscribers = Arc::new(SubscriberStore::load(&config.subscribers_path)?);

    let sheet = config.sheet.as_ref().map(SheetClient::new);
    let csv = config.csv.as_ref().map(|c| CsvStore::new(&c.path));
    let git = config.csv.as_ref().and_then(|c| {
        c.git_remote
            .as_ref()
            .map(|remote| GitSync::new(remote, &c.git_branch))
    });
    let recorder = Recorder::new(sheet, csv, git);
    let notifier = config.messaging.as_ref().map(Notifier::new);

    // The webhook listener runs alongside the form application, sharing the
    // subscriber store
    if let Some(messaging) = &config.messaging {
        let webhook_state = Arc::new(WebhookState {
            channel_secret: messaging.channel_secret.clone(),
            subscribers: Arc::clone(&subscribers),
            notifier: Notifier::new(messaging),
        });
        let webhook_addr = config.webhook_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = webhook::run(&webhook_addr, webhook_state).await {
                log::error!("webhook listener stopped: {}", e);
            }
        });
    }

    let state = Arc::new(AppState {
        predictor,
        recorder: tokio::sync::Mutex::new(recorder),
        notifier,
        subscribers,
    });

    app::run(&config.listen_addr, state).await?;
    Ok(())
}
