// Request queue
//
// Owns every in-flight call together with its completion callback. Nothing
// happens in the background from the queue's point of view: the host loop
// calls `poll()` and each finished call is classified, handed to its callback
// and evicted right there, on the polling thread.

use tracing::{debug, error};

use crate::outcome::ApiCallResult;
use crate::transport::{ApiRequest, Exchange, HttpResponse, Transport};

/// Completion callback. Receives the classification and the raw response.
///
/// A transport failure still runs the callback, once, after the error
/// handler: the response is empty with status 0, so the result is `Unknown`.
pub type Callback = Box<dyn FnOnce(ApiCallResult, &HttpResponse)>;

/// Receives human-readable transport error messages.
pub type ErrorHandler = Box<dyn FnMut(&str)>;

struct PendingCall {
    exchange: Box<dyn Exchange>,
    callback: Option<Callback>,
    label: String,
}

/// Poll-driven set of in-flight calls.
pub struct RequestQueue {
    transport: Box<dyn Transport>,
    pending: Vec<PendingCall>,
    error_handler: Option<ErrorHandler>,
}

impl RequestQueue {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            pending: Vec::new(),
            error_handler: None,
        }
    }

    /// Start `request` and remember `callback` for when it finishes.
    ///
    /// Returns as soon as the transport has accepted the request.
    pub fn enqueue(&mut self, request: ApiRequest, callback: Option<Callback>) {
        let label = format!("{} {}", request.method, request.path);
        debug!(call = %label, pending = self.pending.len() + 1, "enqueued");
        let exchange = self.transport.start(request);
        self.pending.push(PendingCall {
            exchange,
            callback,
            label,
        });
    }

    /// Complete every call whose exchange has finished.
    ///
    /// Each pending call is looked at exactly once per poll, in enqueue
    /// order. Finished calls are classified, their callback (if any) is
    /// invoked, and then they are dropped. Unfinished calls stay for the next
    /// poll. Returns the number of calls completed.
    pub fn poll(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut completed = 0;
        let error_handler = &mut self.error_handler;

        self.pending.retain_mut(|call| {
            if !call.exchange.is_finished() {
                return true;
            }

            let response = call.exchange.take_response().unwrap_or_else(|e| {
                let message = format!("{} failed: {e}", call.label);
                error!("{message}");
                if let Some(handler) = error_handler.as_mut() {
                    handler(&message);
                }
                HttpResponse::transport_failure()
            });

            let result = ApiCallResult::from_status(response.status);
            debug!(call = %call.label, status = response.status, %result, "completed");

            if let Some(callback) = call.callback.take() {
                callback(result, &response);
            }
            completed += 1;
            false
        });

        completed
    }

    /// Number of calls still waiting on the transport.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Install (or replace) the transport error handler.
    pub fn set_error_handler(&mut self, handler: impl FnMut(&str) + 'static) {
        self.error_handler = Some(Box::new(handler));
    }

    pub fn clear_error_handler(&mut self) {
        self.error_handler = None;
    }

    /// Forward a message to the error handler, if one is installed.
    pub fn report_error(&mut self, message: &str) {
        if let Some(handler) = self.error_handler.as_mut() {
            handler(message);
        }
    }
}

impl Drop for RequestQueue {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "dropping queue with calls in flight");
        }
    }
}
