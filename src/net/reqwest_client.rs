use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};

use super::http_client::{HttpClient, HttpMethod, NetworkError, RequestBody, RequestDescriptor};

/// Header carrying the API token on every request.
pub const AUTH_TOKEN_HEADER: &str = "X-Practicum-Mobile-Token";

/// [`HttpClient`] over `reqwest`, stamping the auth token onto every request.
pub struct ReqwestHttpClient {
    client: Client,
    token: String,
}

impl ReqwestHttpClient {
    pub fn new(token: impl Into<String>, timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| NetworkError::InvalidRequest(format!("HTTP client: {}", err)))?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn build_request(&self, descriptor: &RequestDescriptor) -> RequestBuilder {
        let method = match descriptor.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, descriptor.url.clone())
            .header(AUTH_TOKEN_HEADER, &self.token);

        for (name, value) in &descriptor.headers {
            builder = builder.header(name, value);
        }

        match &descriptor.body {
            // Sets Content-Type and encodes repeated keys as `k=a&k=b`
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            None => builder,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: RequestDescriptor) -> Result<Vec<u8>, NetworkError> {
        tracing::debug!("Sending {}", request);

        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|err| NetworkError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered {}", request, status);
            return Err(NetworkError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| NetworkError::Transport(err.to_string()))?;

        tracing::debug!("{} answered {} with {} bytes", request, status, body.len());
        Ok(body.to_vec())
    }
}
