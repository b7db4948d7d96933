use std::fmt;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failures of a single request, as seen by callers of [`HttpClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No response: connectivity, DNS, TLS, timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// A response arrived but its body does not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`, keys may repeat.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn form_pairs(&self) -> &[(String, String)] {
        match self {
            RequestBody::Form(pairs) => pairs,
        }
    }
}

/// Everything needed to issue one request.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            url,
            method,
            headers: vec![("Accept".to_owned(), "application/json".to_owned())],
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Request/response transport. Implementations must treat any status outside
/// `200..300` as [`NetworkError::HttpStatus`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<Vec<u8>, NetworkError>;
}

/// Typed variant of [`HttpClient::send`], decoding the body as JSON.
#[async_trait]
pub trait HttpClientExt {
    async fn send_typed<T>(&self, request: RequestDescriptor) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<C> HttpClientExt for C
where
    C: HttpClient + ?Sized,
{
    async fn send_typed<T>(&self, request: RequestDescriptor) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send,
    {
        let bytes = self.send(request).await?;
        decode_json(&bytes)
    }
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NetworkError> {
    serde_json::from_slice(bytes).map_err(|err| NetworkError::Decode(err.to_string()))
}

pub mod test_util {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;
    use parking_lot::RwLock;
    use serde::Serialize;
    use tokio::sync::Semaphore;

    use super::{HttpClient, HttpMethod, NetworkError, RequestDescriptor};

    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Reply { status: u16, body: Vec<u8> },
        Fail(NetworkError),
    }

    impl MockResponse {
        pub fn json(value: &impl Serialize) -> Self {
            Self::Reply {
                status: 200,
                body: serde_json::to_vec(value).unwrap_or_default(),
            }
        }

        pub fn raw(status: u16, body: &str) -> Self {
            Self::Reply {
                status,
                body: body.as_bytes().to_vec(),
            }
        }

        pub fn status(status: u16) -> Self {
            Self::raw(status, "")
        }
    }

    /// In-memory server keyed by method and URL path.
    ///
    /// Every request is logged. A path can be gated: each request to it then
    /// waits for one permit released by the test before being answered.
    #[derive(Default)]
    pub struct MockHttpClient {
        routes: RwLock<HashMap<(HttpMethod, String), MockResponse>>,
        gates: RwLock<HashMap<String, Arc<Semaphore>>>,
        requests: RwLock<Vec<RequestDescriptor>>,
        answered: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(&self, method: HttpMethod, path: &str, response: MockResponse) {
            self.routes
                .write()
                .insert((method, path.to_owned()), response);
        }

        pub fn route_get(&self, path: &str, response: MockResponse) {
            self.route(HttpMethod::Get, path, response);
        }

        pub fn route_put(&self, path: &str, response: MockResponse) {
            self.route(HttpMethod::Put, path, response);
        }

        pub fn gate(&self, path: &str) -> Arc<Semaphore> {
            self.gates
                .write()
                .entry(path.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(0)))
                .clone()
        }

        pub fn requests(&self) -> Vec<RequestDescriptor> {
            self.requests.read().clone()
        }

        pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<RequestDescriptor> {
            self.requests
                .read()
                .iter()
                .filter(|r| r.method == method && r.url.path() == path)
                .cloned()
                .collect()
        }

        pub fn answered(&self) -> usize {
            self.answered.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn send(&self, request: RequestDescriptor) -> Result<Vec<u8>, NetworkError> {
            let path = request.url.path().to_owned();
            let method = request.method;
            self.requests.write().push(request);

            let gate = self.gates.read().get(&path).cloned();
            if let Some(gate) = gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|err| NetworkError::Transport(err.to_string()))?;
                permit.forget();
            }

            let response = self.routes.read().get(&(method, path.clone())).cloned();
            self.answered.fetch_add(1, Ordering::Relaxed);

            match response {
                Some(MockResponse::Reply { status, body }) if (200..300).contains(&status) => {
                    Ok(body)
                }
                Some(MockResponse::Reply { status, .. }) => Err(NetworkError::HttpStatus(status)),
                Some(MockResponse::Fail(err)) => Err(err),
                None => Err(NetworkError::HttpStatus(404)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{test_util::*, *};

    #[derive(Deserialize, Debug, PartialEq)]
    struct Counter {
        value: u32,
    }

    fn url(path: &str) -> Url {
        Url::parse("https://api.test").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_send_typed_decodes_body() {
        let client = MockHttpClient::new();
        client.route_get("/counter", MockResponse::raw(200, r#"{"value": 7}"#));

        let counter: Counter = client.send_typed(RequestDescriptor::get(url("/counter"))).await.unwrap();
        assert_eq!(counter, Counter { value: 7 });
    }

    #[tokio::test]
    async fn test_error_kinds_are_distinct() {
        let client = MockHttpClient::new();
        client.route_get("/broken", MockResponse::raw(200, "<html>"));
        client.route_get("/missing", MockResponse::status(404));
        client.route_get("/redirect", MockResponse::status(302));
        client.route_get(
            "/offline",
            MockResponse::Fail(NetworkError::Transport("offline".into())),
        );

        let decode = client
            .send_typed::<Counter>(RequestDescriptor::get(url("/broken")))
            .await;
        assert!(matches!(decode, Err(NetworkError::Decode(_))));

        let status = client.send(RequestDescriptor::get(url("/missing"))).await;
        assert_eq!(status, Err(NetworkError::HttpStatus(404)));

        let status = client.send(RequestDescriptor::get(url("/redirect"))).await;
        assert_eq!(status, Err(NetworkError::HttpStatus(302)));

        let transport = client.send(RequestDescriptor::get(url("/offline"))).await;
        assert!(matches!(transport, Err(NetworkError::Transport(_))));

        assert_eq!(client.requests().len(), 4);
        assert_eq!(client.answered(), 4);
    }

    #[test]
    fn test_descriptor_builders() {
        let descriptor = RequestDescriptor::put(url("/api/v1/orders/1"))
            .with_header("X-Test", "1")
            .with_form(vec![("nfts".into(), "a".into()), ("nfts".into(), "b".into())]);

        assert_eq!(descriptor.method, HttpMethod::Put);
        assert_eq!(descriptor.to_string(), "PUT https://api.test/api/v1/orders/1");
        assert!(descriptor
            .headers
            .contains(&("Accept".to_owned(), "application/json".to_owned())));
        assert_eq!(
            descriptor.body.as_ref().unwrap().form_pairs(),
            &[("nfts".to_owned(), "a".to_owned()), ("nfts".to_owned(), "b".to_owned())]
        );
    }
}
