// Result classification
//
// Downstream code never looks at raw status codes. Every finished exchange is
// reduced to an `ApiCallResult` first, and callbacks branch on that.

use strum::Display;

/// Semantic outcome of a finished API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiCallResult {
    /// Any 2xx status.
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    TooManyRequests,
    /// Any status of 500 or above.
    ServerError,
    /// Everything else, including transport failures (reported as status 0).
    Unknown,
    /// The server answered 2xx but the body did not decode.
    ///
    /// Never produced by [`from_status`](Self::from_status); the public
    /// operations substitute it for `Ok` when decoding fails.
    MalformedBody,
}

impl ApiCallResult {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Ok,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::TooManyRequests,
            500.. => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<reqwest::StatusCode> for ApiCallResult {
    fn from(status: reqwest::StatusCode) -> Self {
        Self::from_status(status.as_u16())
    }
}
