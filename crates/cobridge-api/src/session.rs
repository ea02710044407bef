use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};

use crate::error::Error;

/// Port used when a host spec carries no `:port` suffix.
pub const DEFAULT_PORT: u16 = 80;

/// Host and credential context shared by every outgoing request.
///
/// Starts out empty (no address, port 80, empty key) and is updated in place
/// by [`set_host`](Self::set_host) and by login.
#[derive(Debug, Clone)]
pub struct Session {
    address: String,
    port: u16,
    api_key: SecretString,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: DEFAULT_PORT,
            api_key: SecretString::from(String::new()),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `address` or `address:port` and store both parts.
    ///
    /// The session is left untouched when the spec is rejected.
    pub fn set_host(&mut self, spec: &str) -> Result<(), Error> {
        let (address, port) = parse_host(spec).inspect_err(|e| error!("{e}"))?;
        debug!(%address, port, "host configured");
        self.address = address.to_owned();
        self.port = port;
        Ok(())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The key sent with every request. Empty until one is set.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn set_api_key(&mut self, key: SecretString) {
        self.api_key = key;
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

fn parse_host(spec: &str) -> Result<(&str, u16), Error> {
    let invalid = |reason: String| Error::InvalidHost {
        spec: spec.to_owned(),
        reason,
    };

    let (address, port) = match spec.split_once(':') {
        Some((address, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| invalid(format!("bad port '{port}': {e}")))?;
            (address, port)
        }
        None => (spec, DEFAULT_PORT),
    };

    if address.is_empty() {
        return Err(invalid("missing address".into()));
    }

    Ok((address, port))
}
