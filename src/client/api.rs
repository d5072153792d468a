use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::accounts::PublicUser;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body (status {status}): {source}")]
    UnexpectedBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// The `{success, message, user?, userId?}` envelope, plus the HTTP status
/// it arrived with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReply {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub user: Option<PublicUser>,
    pub user_id: Option<i64>,
}

impl ApiReply {
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Account endpoints as seen by the form controllers.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<ApiReply, ClientError>;

    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<ApiReply, ClientError>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

/// `AccountApi` over HTTP against a running server.
#[derive(Clone)]
pub struct HttpAccountApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, path: &str, body: &Credentials<'_>) -> Result<ApiReply, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        let status: StatusCode = response.status();
        let bytes = response.bytes().await?;
        debug!(%url, %status, "api reply");

        let mut reply: ApiReply =
            serde_json::from_slice(&bytes).map_err(|source| ClientError::UnexpectedBody {
                status: status.as_u16(),
                source,
            })?;
        reply.status = status.as_u16();
        Ok(reply)
    }
}

#[async_trait]
impl AccountApi for HttpAccountApi {
    async fn login(&self, username: &str, password: &str) -> Result<ApiReply, ClientError> {
        self.post(
            "/api/login",
            &Credentials {
                username,
                password,
                email: None,
            },
        )
        .await
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<ApiReply, ClientError> {
        self.post(
            "/api/register",
            &Credentials {
                username,
                password,
                email: Some(email),
            },
        )
        .await
    }
}
