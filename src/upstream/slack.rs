use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::UpstreamError;
use crate::config::SlackConfig;

const SERVICE: &str = "slack";

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), UpstreamError>;
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Web API replies carry `ok`; plain webhooks answer with a bare "ok" body.
#[derive(Debug, Deserialize)]
struct PostMessageReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackMessenger {
    client: reqwest::Client,
    api_url: String,
    bot_token: Option<String>,
}

impl SlackMessenger {
    pub fn new(client: reqwest::Client, cfg: &SlackConfig) -> Self {
        Self {
            client,
            api_url: cfg.api_url.clone(),
            bot_token: cfg.bot_token.clone(),
        }
    }
}

fn check_reply(body: &[u8]) -> Result<(), UpstreamError> {
    match serde_json::from_slice::<PostMessageReply>(body) {
        Ok(reply) if !reply.ok => Err(UpstreamError::Rejected {
            service: SERVICE,
            status: reply.error.unwrap_or_else(|| "not_ok".into()),
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl Messenger for SlackMessenger {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), UpstreamError> {
        let mut req = self
            .client
            .post(&self.api_url)
            .json(&PostMessage { channel, text });
        if let Some(token) = &self.bot_token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.map_err(UpstreamError::transport(SERVICE))?;

        let status = res.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        let body = res
            .bytes()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        check_reply(&body)?;
        debug!(%channel, "slack message posted");
        Ok(())
    }
}
