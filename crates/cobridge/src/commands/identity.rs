//! Login, identify and startup handlers.
//!
//! Every handler logs in first: the key only reaches the session through
//! login, and the calls queued behind it pick it up immediately.

use std::cell::RefCell;
use std::rc::Rc;

use secrecy::{ExposeSecret, SecretString};

use cobridge_api::{ApiCallResult, IdentifiedUserGroup, LoggedInUser};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::commands::Backend;
use crate::error::CliError;
use crate::output;

type Slot<T> = Rc<RefCell<Option<(ApiCallResult, Option<T>)>>>;

fn take<T>(slot: &Slot<T>) -> (ApiCallResult, Option<T>) {
    // A drained queue has run every callback.
    slot.borrow_mut().take().unwrap_or((ApiCallResult::Unknown, None))
}

pub fn whoami(backend: &mut Backend, key: &SecretString, global: &GlobalOpts) -> Result<(), CliError> {
    let slot: Slot<LoggedInUser> = Slot::default();
    let sink = Rc::clone(&slot);
    backend
        .client()
        .login(key.expose_secret(), move |result, user| {
            *sink.borrow_mut() = Some((result, user));
        });
    backend.drain();

    let (result, user) = take(&slot);
    backend.check("login", result)?;
    match (global.output, user) {
        (OutputFormat::Plain, Some(user)) => println!("{}", user.username),
        (format, user) => output::print_json(&user, format)?,
    }
    Ok(())
}

pub fn identify(
    backend: &mut Backend,
    key: &SecretString,
    ids: &[u64],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let login = backend.login(key);
    let slot: Slot<IdentifiedUserGroup> = Slot::default();
    let sink = Rc::clone(&slot);
    backend.client().identify_users(ids, move |result, group| {
        *sink.borrow_mut() = Some((result, group));
    });
    backend.drain();

    let login = login.borrow_mut().take().unwrap_or(ApiCallResult::Unknown);
    backend.check("login", login)?;
    let (result, group) = take(&slot);
    backend.check("identify", result)?;

    let group = group.unwrap_or_default();
    match global.output {
        OutputFormat::Plain => {
            for (id, user) in group.iter() {
                println!("{}", output::user_line(id, user));
            }
        }
        format => output::print_json(&group, format)?,
    }
    Ok(())
}

pub fn startup(backend: &mut Backend, key: &SecretString, id: u64) -> Result<(), CliError> {
    let login = backend.login(key);
    backend.client().notify_startup(id);
    backend.drain();

    let login = login.borrow_mut().take().unwrap_or(ApiCallResult::Unknown);
    backend.check("login", login)?;
    tracing::info!(id, "startup notification sent");
    Ok(())
}
