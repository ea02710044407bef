//! Output rendering.

use serde::Serialize;

use cobridge_api::IdentifiedUser;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Print a value as JSON. `Plain` falls back to compact JSON.
pub fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), CliError> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::JsonCompact | OutputFormat::Plain => serde_json::to_string(value)?,
    };
    println!("{text}");
    Ok(())
}

/// `id  username  verified  groups  software`, tab separated.
pub fn user_line(id: u64, user: &IdentifiedUser) -> String {
    let groups = user
        .groups
        .iter()
        .map(|g| g.display_name.as_deref().unwrap_or(&g.name))
        .collect::<Vec<_>>()
        .join(",");
    let software = user.software.as_ref().map_or("-", |s| s.name.as_str());
    format!(
        "{id}\t{}\t{}\t{}\t{software}",
        user.username,
        if user.verified { "verified" } else { "unverified" },
        if groups.is_empty() { "-" } else { &groups },
    )
}

#[cfg(test)]
mod tests {
    use cobridge_api::{Group, Software};

    use super::*;

    #[test]
    fn plain_line_prefers_display_names() {
        let user = IdentifiedUser {
            username: "gabe".into(),
            verified: true,
            color: None,
            groups: vec![
                Group {
                    name: "admins".into(),
                    display_name: Some("Admin".into()),
                },
                Group {
                    name: "donors".into(),
                    display_name: None,
                },
            ],
            software: Some(Software {
                name: "cathook".into(),
                friendly: true,
            }),
        };
        assert_eq!(user_line(7, &user), "7\tgabe\tverified\tAdmin,donors\tcathook");
    }

    #[test]
    fn plain_line_with_nothing_optional() {
        let user = IdentifiedUser {
            username: "anon".into(),
            verified: false,
            color: None,
            groups: Vec::new(),
            software: None,
        };
        assert_eq!(user_line(1, &user), "1\tanon\tunverified\t-\t-");
    }
}
