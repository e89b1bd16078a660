//! HTTP transport: one authenticated request in, parsed JSON or a classified error out.
//!
//! Retries live in [`HttpTransport::send_idempotent`] and only ever re-send
//! requests that carry no body.

use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use reqwest::{Client, Method, Url};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{classify, AutofillerError, Result};

/// A single API request.
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    form: Option<Form>,
    requires_auth: bool,
}

impl ApiRequest {
    /// GET request for the given path segments (each is percent-encoded).
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    /// POST request with a multipart body.
    pub fn post_multipart<I, S>(segments: I, form: Form) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = Self::new(Method::POST, segments);
        request.form = Some(form);
        request
    }

    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            form: None,
            requires_auth: true,
        }
    }

    /// Send without the `Authorization` header (health check only).
    pub fn unauthenticated(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Sends requests to the Autofiller API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base: Url,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(config.base_url()).map_err(|e| {
            AutofillerError::validation(format!("Invalid base URL {:?}: {}", config.base_url(), e))
        })?;
        if base.cannot_be_a_base() {
            return Err(AutofillerError::validation(format!(
                "Invalid base URL {:?}",
                config.base_url()
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("autofiller-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AutofillerError::api("client_build_failed", e.to_string()))?;

        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[String]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send one request. No retries.
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.endpoint(&request.segments);
        let path = request.path();
        let method = request.method.clone();
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method, url)
            .header(ACCEPT, "application/json");

        if request.requires_auth {
            builder = builder.bearer_auth(self.config.api_key().expose_secret());
        }
        if let Some(form) = request.form {
            builder = builder.multipart(form);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "Autofiller request failed");
            AutofillerError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Autofiller request"
        );

        if !status.is_success() {
            let err = classify(status, &body);
            warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                code = err.code(),
                "Autofiller API error"
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            AutofillerError::protocol(format!("Malformed JSON from {} {}: {}", method, path, e))
        })
    }

    /// Send a bodiless request, re-sending it on transient failures.
    ///
    /// `build` is called once per attempt and must produce the same request each time.
    /// At most `max_retries` extra attempts are made, `retry_delay * attempt` apart.
    pub async fn send_idempotent<F>(&self, build: F) -> Result<Value>
    where
        F: Fn() -> ApiRequest,
    {
        let max_retries = self.config.max_retries();
        let mut retries = 0;

        loop {
            let request = build();
            if request.form.is_some() {
                return Err(AutofillerError::validation(
                    "Requests with a body cannot be retried",
                ));
            }
            let path = request.path();

            match self.send(request).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < max_retries => {
                    retries += 1;
                    warn!(
                        path = %path,
                        error = %e,
                        retry = retries,
                        max_retries,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay() * retries).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
