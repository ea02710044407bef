// Online service client
//
// Public operations against the game backend. Every operation builds an
// `ApiRequest` from the session plus its arguments, enqueues it with a
// decoding callback and returns immediately. Results arrive later, from
// inside `poll()`.

use reqwest::Method;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::{IdentifiedUserGroup, LoggedInUser, decode};
use crate::outcome::ApiCallResult;
use crate::queue::RequestQueue;
use crate::session::Session;
use crate::transport::{ApiRequest, HttpResponse, Transport};

const LOGIN_PATH: &str = "/user/me";
const IDENTIFY_PATH: &str = "/game/identify";
const STARTUP_PATH: &str = "/game/startup";

/// Client for the community game-backend service.
///
/// Owns the session (host, port, API key) and the queue of in-flight calls.
/// Operations and [`poll`](Self::poll) all take `&mut self`, so a single
/// driving thread is enforced by the borrow checker rather than by locks.
pub struct OnlineClient {
    session: Session,
    queue: RequestQueue,
}

impl OnlineClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_session(transport, Session::new())
    }

    /// Start from an already configured session.
    pub fn with_session(transport: impl Transport + 'static, session: Session) -> Self {
        Self {
            session,
            queue: RequestQueue::new(Box::new(transport)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Point the client at `address` or `address:port` (port defaults to 80).
    pub fn set_host(&mut self, spec: &str) -> Result<(), Error> {
        self.session.set_host(spec)
    }

    /// Install (or replace) the transport error handler.
    pub fn set_error_handler(&mut self, handler: impl FnMut(&str) + 'static) {
        self.queue.set_error_handler(handler);
    }

    /// Send a message to the error handler, if any.
    pub fn report_error(&mut self, message: &str) {
        self.queue.report_error(message);
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Log in with `key` and look up the account behind it.
    ///
    /// `GET /user/me?key=…`. The key is stored in the session before the
    /// request goes out, so it is in effect even while the call is pending,
    /// whatever the outcome.
    pub fn login<F>(&mut self, key: impl Into<String>, callback: F)
    where
        F: FnOnce(ApiCallResult, Option<LoggedInUser>) + 'static,
    {
        self.session.set_api_key(SecretString::from(key.into()));
        let request = self.request(Method::GET, LOGIN_PATH, Vec::new());
        self.queue.enqueue(
            request,
            Some(Box::new(move |result, response: &HttpResponse| {
                let (result, user) = decode_on_ok(result, response);
                callback(result, user);
            })),
        );
    }

    /// Resolve a batch of external user ids.
    ///
    /// `GET /game/identify?key=…&ids=1,2,3`. An empty slice sends an empty
    /// `ids` value.
    pub fn identify_users<F>(&mut self, ids: &[u64], callback: F)
    where
        F: FnOnce(ApiCallResult, Option<IdentifiedUserGroup>) + 'static,
    {
        let ids = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self.request(Method::GET, IDENTIFY_PATH, vec![("ids", ids)]);
        self.queue.enqueue(
            request,
            Some(Box::new(move |result, response: &HttpResponse| {
                let (result, group) = decode_on_ok(result, response);
                callback(result, group);
            })),
        );
    }

    /// Tell the backend that `user_id` started the game. Fire and forget.
    ///
    /// `POST /game/startup` with `key` and `steam` form fields.
    pub fn notify_startup(&mut self, user_id: u64) {
        let request = self.request(
            Method::POST,
            STARTUP_PATH,
            vec![("steam", user_id.to_string())],
        );
        self.queue.enqueue(request, None);
    }

    // ── Driving ──────────────────────────────────────────────────────

    /// Complete every call whose response has arrived. Returns how many did.
    pub fn poll(&mut self) -> usize {
        self.queue.poll()
    }

    /// Number of calls still in flight.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> ApiRequest {
        if !self.session.has_api_key() {
            debug!(path, "no API key set, sending an empty one");
        }
        ApiRequest {
            method,
            address: self.session.address().to_owned(),
            port: self.session.port(),
            path: path.to_owned(),
            key: self.session.api_key().clone(),
            params,
        }
    }
}

/// Decode the body of an OK response; anything else carries no value.
fn decode_on_ok<T: DeserializeOwned>(
    result: ApiCallResult,
    response: &HttpResponse,
) -> (ApiCallResult, Option<T>) {
    if !result.is_ok() {
        return (result, None);
    }
    match decode(&response.body) {
        Ok(value) => (result, Some(value)),
        Err(e) => {
            warn!(error = %e, "discarding malformed response body");
            (ApiCallResult::MalformedBody, None)
        }
    }
}
