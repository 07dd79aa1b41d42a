//! Parse Server adapter using the `/schemas` REST endpoints
//!
//! All calls authenticate with the application id and master key headers:
//!
//! | operation | request |
//! |---|---|
//! | fetch  | `GET    {server_url}/schemas` |
//! | create | `POST   {server_url}/schemas/{className}` |
//! | update | `PUT    {server_url}/schemas/{className}` |
//! | delete | `DELETE {server_url}/schemas/{className}` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connection = config.connection.resolve()?;
//! let adapter = ParseAdapter::new(&connection)?;
//! let remote = adapter.fetch_schemas().await?;
//! ```

use crate::adapter::{SchemaService, ServiceError};
use parsesync_core::{ClassSchema, ClassUpdate, ConnectionConfig, SchemaSet};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const APP_ID_HEADER: &str = "X-Parse-Application-Id";
const MASTER_KEY_HEADER: &str = "X-Parse-Master-Key";

/// Body of `GET /schemas`
#[derive(Debug, Deserialize)]
struct SchemaListing {
    results: SchemaSet,
}

/// Error body returned by Parse Server
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse Server schema adapter
pub struct ParseAdapter {
    client: Client,
    server_url: String,
    app_id: String,
    master_key: String,
}

impl ParseAdapter {
    /// Create an adapter for a validated connection
    pub fn new(connection: &ConnectionConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(connection.timeout_secs))
            .user_agent(concat!("parsesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            server_url: connection.server_url.trim_end_matches('/').to_string(),
            app_id: connection.app_id.clone(),
            master_key: connection.master_key.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.server_url, path))
            .header(APP_ID_HEADER, &self.app_id)
            .header(MASTER_KEY_HEADER, &self.master_key)
    }

    fn class_path(class_name: &str) -> String {
        format!("schemas/{class_name}")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "schema service response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed.error.unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.clone()
            }
        });

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(message),
            _ => ServiceError::RemoteRejected {
                status: status.as_u16(),
                code: parsed.code,
                message,
            },
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Unreachable(format!("request timed out: {error}"))
    } else {
        ServiceError::Unreachable(error.to_string())
    }
}

#[async_trait::async_trait]
impl SchemaService for ParseAdapter {
    fn name(&self) -> &'static str {
        "Parse Server"
    }

    async fn fetch_schemas(&self) -> Result<SchemaSet, ServiceError> {
        let response = self.send(self.request(Method::GET, "schemas")).await?;
        let listing: SchemaListing = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        Ok(listing.results)
    }

    async fn create_class(&self, class: &ClassSchema) -> Result<(), ServiceError> {
        let request = self
            .request(Method::POST, &Self::class_path(&class.class_name))
            .json(class);
        self.send(request).await?;
        Ok(())
    }

    async fn update_class(&self, update: &ClassUpdate) -> Result<(), ServiceError> {
        let request = self
            .request(Method::PUT, &Self::class_path(&update.class_name))
            .json(update);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_class(&self, class_name: &str) -> Result<(), ServiceError> {
        self.send(self.request(Method::DELETE, &Self::class_path(class_name)))
            .await?;
        Ok(())
    }
}
