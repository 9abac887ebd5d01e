use crate::BoxError;
use crate::config::MessagingConfig;
use serde::Serialize;

#[derive(Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl TextMessage {
    fn new(text: &str) -> Self {
        TextMessage {
            kind: "text",
            text: text.to_string(),
        }
    }
}

#[derive(Serialize)]
struct PushBody {
    to: String,
    messages: Vec<TextMessage>,
}

#[derive(Serialize)]
struct ReplyBody {
    #[serde(rename = "replyToken")]
    reply_token: String,
    messages: Vec<TextMessage>,
}

/// Outcome of a best-effort broadcast.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Client for the messaging platform's push and reply endpoints.
pub struct Notifier {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl Notifier {
    pub fn new(config: &MessagingConfig) -> Self {
        Notifier {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.channel_token.clone(),
        }
    }

    /// Push one text message to one recipient. Success is HTTP 200.
    pub async fn push(&self, to: &str, text: &str) -> Result<(), BoxError> {
        let body = PushBody {
            to: to.to_string(),
            messages: vec![TextMessage::new(text)],
        };

        self.http
            .post(format!("{}/v2/bot/message/push", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Reply to a webhook event using its reply token.
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<(), BoxError> {
        let body = ReplyBody {
            reply_token: reply_token.to_string(),
            messages: vec![TextMessage::new(text)],
        };

        self.http
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Deliver one message to every subscriber, one network call at a time.
    ///
    /// A per-recipient failure is logged and counted; it never halts
    /// delivery to the remaining recipients.
    pub async fn broadcast(&self, recipients: &[String], text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for recipient in recipients {
            match self.push(recipient, text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log::warn!("push to {} failed: {}", recipient, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
