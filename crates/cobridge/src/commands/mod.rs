//! Command dispatch: builds the backend client from config + flags and
//! drives its request queue until every call has completed.

pub mod config_cmd;
pub mod identity;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::runtime::Runtime;

use cobridge_api::{ApiCallResult, OnlineClient, ReqwestTransport};
use cobridge_config::{Config, ConfigError};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = cobridge_config::load_config()?;
    let mut backend = Backend::connect(&cfg, global)?;
    let key = api_key(&cfg, global)?;

    match cmd {
        Command::Whoami => identity::whoami(&mut backend, &key, global),
        Command::Identify(args) => identity::identify(&mut backend, &key, &args.ids, global),
        Command::Startup(args) => identity::startup(&mut backend, &key, args.id),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// `--api-key` flag first, then the config's credential chain.
fn api_key(cfg: &Config, global: &GlobalOpts) -> Result<SecretString, CliError> {
    if let Some(ref key) = global.api_key {
        return Ok(SecretString::from(key.clone()));
    }
    cobridge_config::resolve_api_key(cfg).map_err(|e| match e {
        ConfigError::NoCredentials => CliError::NoCredentials,
        other => other.into(),
    })
}

/// A configured client plus the runtime its exchanges run on.
pub struct Backend {
    client: OnlineClient,
    host: String,
    poll_interval: Duration,
    transport_errors: Rc<RefCell<Vec<String>>>,
    // Declared last so in-flight exchanges are dropped before the runtime.
    _runtime: Runtime,
}

impl Backend {
    pub fn connect(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let mut cfg = cfg.clone();
        if let Some(ref host) = global.host {
            cfg.host.clone_from(host);
        }
        if let Some(timeout) = global.timeout {
            cfg.timeout = timeout;
        }

        let session = cfg.session()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cobridge-io")
            .enable_all()
            .build()?;
        let transport = ReqwestTransport::new(&cfg.transport(), runtime.handle().clone())?;

        let mut client = OnlineClient::with_session(transport, session);
        let transport_errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&transport_errors);
        client.set_error_handler(move |message| {
            tracing::error!("{message}");
            sink.borrow_mut().push(message.to_owned());
        });

        tracing::debug!(host = %cfg.host, timeout = cfg.timeout, "backend client ready");
        Ok(Self {
            client,
            poll_interval: cfg.poll_interval(),
            host: cfg.host,
            transport_errors,
            _runtime: runtime,
        })
    }

    pub fn client(&mut self) -> &mut OnlineClient {
        &mut self.client
    }

    pub fn login(&mut self, key: &SecretString) -> Rc<RefCell<Option<ApiCallResult>>> {
        let outcome = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&outcome);
        self.client
            .login(key.expose_secret(), move |result, user| {
                if let Some(user) = user {
                    tracing::info!(username = %user.username, "logged in");
                }
                *slot.borrow_mut() = Some(result);
            });
        outcome
    }

    /// Poll until the queue is empty.
    pub fn drain(&mut self) {
        loop {
            let completed = self.client.poll();
            if completed > 0 {
                tracing::trace!(completed, pending = self.client.pending(), "polled");
            }
            if self.client.is_idle() {
                return;
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    /// Turn a call outcome into `Ok(())` or the matching CLI error.
    pub fn check(&self, operation: &'static str, outcome: ApiCallResult) -> Result<(), CliError> {
        if outcome.is_ok() {
            return Ok(());
        }
        if outcome == ApiCallResult::Unknown {
            if let Some(message) = self.transport_errors.borrow().last() {
                return Err(CliError::ConnectionFailed {
                    host: self.host.clone(),
                    message: message.clone(),
                });
            }
        }
        Err(CliError::CallFailed { operation, outcome })
    }
}
