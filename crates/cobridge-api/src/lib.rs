// cobridge-api: poll-driven client for the community game-backend web service

pub mod client;
pub mod error;
pub mod models;
pub mod outcome;
pub mod queue;
pub mod session;
pub mod transport;

pub use client::OnlineClient;
pub use error::Error;
pub use models::{Group, IdentifiedUser, IdentifiedUserGroup, LoggedInUser, Software};
pub use outcome::ApiCallResult;
pub use queue::{Callback, ErrorHandler, RequestQueue};
pub use session::{DEFAULT_PORT, Session};
pub use transport::{
    ApiRequest, Exchange, HttpResponse, ReqwestTransport, Transport, TransportConfig,
};
