//! Relay client for the hosted kex endpoints.
//!
//! - `POST {base}/kex/send`, form encoded: `dir`, `I`, `msg`, `receiver`,
//!   `sender`, `seqno`, `w`.
//! - `GET {base}/kex/receive?w=..&dir=..&low=..&poll=..`
//!
//! Both answer with a JSON envelope whose `status.code` is 0 on success.
//! Receive responses carry the stored messages under `msgs`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RelayConfig;
use crate::error::TransportError;
use crate::ports::{ReceiveRequest, RelayClient, RelayMessage, SendRequest};

#[derive(Serialize)]
struct SendForm<'a> {
    dir: i32,
    #[serde(rename = "I")]
    strong_id: &'a str,
    msg: &'a str,
    receiver: &'a str,
    sender: &'a str,
    seqno: i64,
    w: &'a str,
}

#[derive(Serialize)]
struct ReceiveQuery<'a> {
    w: &'a str,
    dir: i32,
    low: i64,
    poll: u64,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    code: i64,
    #[serde(default)]
    desc: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: ApiStatus,
    #[serde(default)]
    msgs: Vec<RelayMessage>,
}

/// `RelayClient` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    http: Client,
    base_url: String,
    session_token: Option<String>,
    request_timeout: Duration,
}

impl HttpRelayClient {
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Uses a preconfigured `reqwest::Client`.
    pub fn with_client(http: Client, config: &RelayConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: config.session_token.clone(),
            request_timeout: config.request_timeout(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn call(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse, TransportError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if body.status.code != 0 {
            return Err(TransportError::Api {
                code: body.status.code,
                desc: body.status.desc,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(&self, request: SendRequest) -> Result<(), TransportError> {
        let form = SendForm {
            dir: request.direction,
            strong_id: &request.strong_id_hex,
            msg: &request.body,
            receiver: &request.receiver_device_id,
            sender: &request.sender_device_id,
            seqno: request.seqno,
            w: &request.weak_id_hex,
        };
        let builder = self
            .http
            .post(self.endpoint("kex/send"))
            .timeout(self.request_timeout)
            .form(&form);

        self.call(builder).await?;
        debug!(seqno = request.seqno, dir = request.direction, "Posted to kex/send");
        Ok(())
    }

    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<RelayMessage>, TransportError> {
        let query = ReceiveQuery {
            w: &request.weak_id_hex,
            dir: request.direction,
            low: request.low_watermark,
            poll: request.poll_seconds,
        };
        // The relay holds the request open for up to `poll` seconds.
        let timeout = Duration::from_secs(request.poll_seconds) + self.request_timeout;
        let builder = self
            .http
            .get(self.endpoint("kex/receive"))
            .timeout(timeout)
            .query(&query);

        let body = self.call(builder).await?;
        Ok(body.msgs)
    }
}
