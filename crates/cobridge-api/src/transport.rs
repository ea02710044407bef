// HTTP transport
//
// The request queue never talks to the network itself. It hands an
// `ApiRequest` to a `Transport`, gets back an `Exchange` handle, and later
// asks that handle whether it has finished. `ReqwestTransport` runs each
// exchange as a task on a tokio runtime owned by the caller, so the
// completion check is a plain flag read.

use std::fmt;
use std::time::Duration;

use futures_util::FutureExt;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;
use url::Url;

use crate::error::Error;

// ── Requests & responses ─────────────────────────────────────────────

/// A fully built call, ready to hand to a [`Transport`].
///
/// GET parameters travel in the query string, anything else as a
/// url-encoded form body. The API key is always sent first, as `key`.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub address: String,
    pub port: u16,
    pub path: String,
    pub key: SecretString,
    pub params: Vec<(&'static str, String)>,
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("key", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}

impl ApiRequest {
    /// `http://{address}:{port}{path}`
    pub fn url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "http://{}:{}{}",
            self.address, self.port, self.path
        ))?)
    }

    /// Look up a non-key parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn encoded_params(&self) -> Vec<(&str, &str)> {
        std::iter::once(("key", self.key.expose_secret()))
            .chain(self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .collect()
    }
}

/// Status and body of a finished exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Placeholder handed to callbacks when the exchange itself failed.
    /// Status 0 classifies as `Unknown`.
    pub fn transport_failure() -> Self {
        Self::new(0, String::new())
    }
}

// ── Seams ────────────────────────────────────────────────────────────

/// One in-flight HTTP exchange.
pub trait Exchange {
    /// Non-blocking completion check.
    fn is_finished(&self) -> bool;

    /// Take the response. Only meaningful once [`is_finished`](Self::is_finished)
    /// has returned `true`, and only called once.
    fn take_response(&mut self) -> Result<HttpResponse, Error>;
}

/// Starts exchanges. Must return without waiting on the network.
pub trait Transport {
    fn start(&self, request: ApiRequest) -> Box<dyn Exchange>;
}

// ── Reqwest implementation ───────────────────────────────────────────

/// Settings for the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("cobridge/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()?)
    }
}

/// [`Transport`] that spawns one tokio task per exchange.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    runtime: Handle,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig, runtime: Handle) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            runtime,
        })
    }

    /// Use a pre-built client.
    pub fn with_client(http: reqwest::Client, runtime: Handle) -> Self {
        Self { http, runtime }
    }
}

impl Transport for ReqwestTransport {
    fn start(&self, request: ApiRequest) -> Box<dyn Exchange> {
        let http = self.http.clone();
        let handle = self.runtime.spawn(execute(http, request));
        Box::new(SpawnedExchange { handle })
    }
}

async fn execute(http: reqwest::Client, request: ApiRequest) -> Result<HttpResponse, Error> {
    let url = request.url()?;
    trace!(method = %request.method, %url, "sending");

    let params = request.encoded_params();
    let builder = http.request(request.method.clone(), url);
    let builder = if request.method == Method::GET {
        builder.query(&params)
    } else {
        builder.form(&params)
    };

    let resp = builder.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok(HttpResponse { status, body })
}

/// Exchange backed by a spawned task. Dropping it aborts the task.
struct SpawnedExchange {
    handle: JoinHandle<Result<HttpResponse, Error>>,
}

impl Exchange for SpawnedExchange {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn take_response(&mut self) -> Result<HttpResponse, Error> {
        match (&mut self.handle).now_or_never() {
            Some(Ok(result)) => result,
            Some(Err(join)) => Err(Error::ExchangeFailed(join.to_string())),
            None => Err(Error::NotReady),
        }
    }
}

impl Drop for SpawnedExchange {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ── Test support ─────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ApiRequest, Error, Exchange, HttpResponse, Transport};

    /// Shared switch a test flips to finish an exchange.
    #[derive(Clone, Default)]
    pub(crate) struct Completion(Rc<RefCell<Option<Result<HttpResponse, String>>>>);

    impl Completion {
        pub(crate) fn respond(&self, status: u16, body: &str) {
            *self.0.borrow_mut() = Some(Ok(HttpResponse::new(status, body)));
        }

        pub(crate) fn fail(&self, message: &str) {
            *self.0.borrow_mut() = Some(Err(message.to_owned()));
        }
    }

    pub(crate) struct ScriptedExchange {
        completion: Completion,
    }

    impl Exchange for ScriptedExchange {
        fn is_finished(&self) -> bool {
            self.completion.0.borrow().is_some()
        }

        fn take_response(&mut self) -> Result<HttpResponse, Error> {
            match self.completion.0.borrow().clone() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(Error::ExchangeFailed(message)),
                None => Err(Error::NotReady),
            }
        }
    }

    /// Records every request and hands back a completion per request.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedTransport {
        pub(crate) started: Rc<RefCell<Vec<(ApiRequest, Completion)>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn request(&self, index: usize) -> ApiRequest {
            self.started.borrow()[index].0.clone()
        }

        pub(crate) fn completion(&self, index: usize) -> Completion {
            self.started.borrow()[index].1.clone()
        }

        pub(crate) fn count(&self) -> usize {
            self.started.borrow().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn start(&self, request: ApiRequest) -> Box<dyn Exchange> {
            let completion = Completion::default();
            self.started
                .borrow_mut()
                .push((request, completion.clone()));
            Box::new(ScriptedExchange { completion })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn request(method: Method) -> ApiRequest {
        ApiRequest {
            method,
            address: "example.com".into(),
            port: 8080,
            path: "/game/identify".into(),
            key: SecretString::from("secret".to_owned()),
            params: vec![("ids", "1,2".into())],
        }
    }

    #[test]
    fn url_includes_port_and_path() {
        let url = request(Method::GET).url().unwrap();
        assert_eq!(url.as_str(), "http://example.com:8080/game/identify");
    }

    #[test]
    fn url_rejects_empty_host() {
        let mut req = request(Method::GET);
        req.address = String::new();
        assert!(matches!(req.url(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn key_comes_first() {
        let req = request(Method::GET);
        assert_eq!(
            req.encoded_params(),
            vec![("key", "secret"), ("ids", "1,2")]
        );
        assert_eq!(req.param("ids"), Some("1,2"));
        assert_eq!(req.param("key"), None);
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", request(Method::POST));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("cobridge/"));
    }
}
