// Response types
//
// Domain records returned by the backend. Nullable fields map to `Option`
// (null and missing both decode to `None`); a present value of the wrong
// JSON type is a decode failure.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::Error;

// ── Identity records ─────────────────────────────────────────────────

/// A community group a user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default, rename = "display")]
    pub display_name: Option<String>,
}

/// Client software a user has been seen running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    pub friendly: bool,
}

/// Identity record for one external user id, from `/game/identify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedUser {
    pub username: String,
    pub verified: bool,
    #[serde(default)]
    pub color: Option<String>,
    /// Memberships in source order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub software: Option<Software>,
}

/// The account behind an API key, from `/user/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedInUser {
    pub username: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Identify response ────────────────────────────────────────────────

/// Users resolved by `/game/identify`, keyed by their numeric id.
///
/// The response is a JSON object keyed by id strings. Entries are read in
/// sorted key order (byte-wise, so `"12"` comes before `"abc"`) and reading
/// stops at the first key that is not an unsigned integer; whatever was
/// collected up to that point is kept. A malformed user under a numeric key
/// read before the stop fails the whole decode. A repeated key keeps its
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentifiedUserGroup {
    users: BTreeMap<u64, IdentifiedUser>,
}

impl IdentifiedUserGroup {
    pub fn get(&self, id: u64) -> Option<&IdentifiedUser> {
        self.users.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.users.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterate users in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &IdentifiedUser)> {
        self.users.iter().map(|(id, user)| (*id, user))
    }
}

impl IntoIterator for IdentifiedUserGroup {
    type Item = (u64, IdentifiedUser);
    type IntoIter = std::collections::btree_map::IntoIter<u64, IdentifiedUser>;

    fn into_iter(self) -> Self::IntoIter {
        self.users.into_iter()
    }
}

impl<'de> Deserialize<'de> for IdentifiedUserGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UserGroupVisitor)
    }
}

struct UserGroupVisitor;

impl<'de> Visitor<'de> for UserGroupVisitor {
    type Value = IdentifiedUserGroup;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by numeric user id")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        // Keys are visited in sorted string order, not document order.
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
            entries.insert(key, value);
        }

        let mut users = BTreeMap::new();
        for (key, value) in entries {
            let Ok(id) = key.parse::<u64>() else {
                debug!(key = %key, kept = users.len(), "non-numeric user id, ignoring the rest");
                break;
            };
            let user = IdentifiedUser::deserialize(value).map_err(de::Error::custom)?;
            users.insert(id, user);
        }

        Ok(IdentifiedUserGroup { users })
    }
}

// ── Decoding helpers ─────────────────────────────────────────────────

/// Decode a response body, keeping the raw text on failure.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

/// Decode an already-parsed JSON value.
pub fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, Error> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn user_json(name: &str) -> serde_json::Value {
        json!({
            "username": name,
            "verified": true,
            "color": null,
            "groups": [],
            "software": null
        })
    }

    #[test]
    fn group_with_null_display() {
        let group: Group = decode_value(json!({ "name": "Admins", "display": null })).unwrap();
        assert_eq!(
            group,
            Group {
                name: "Admins".into(),
                display_name: None
            }
        );
    }

    #[test]
    fn group_with_display() {
        let group: Group = decode_value(json!({ "name": "Admins", "display": "VIP" })).unwrap();
        assert_eq!(group.display_name.as_deref(), Some("VIP"));
    }

    #[test]
    fn group_display_of_wrong_type_fails() {
        let result = decode_value::<Group>(json!({ "name": "Admins", "display": 7 }));
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn full_identified_user() {
        let user: IdentifiedUser = decode_value(json!({
            "username": "gabe",
            "verified": true,
            "color": "#ff0000",
            "groups": [
                { "name": "admins", "display": "Admin" },
                { "name": "donors", "display": null }
            ],
            "software": { "name": "cathook", "friendly": true }
        }))
        .unwrap();

        assert_eq!(user.username, "gabe");
        assert!(user.verified);
        assert_eq!(user.color.as_deref(), Some("#ff0000"));
        assert_eq!(user.groups.len(), 2);
        assert_eq!(user.groups[0].name, "admins");
        assert_eq!(user.groups[1].name, "donors");
        assert_eq!(user.groups[1].display_name, None);
        assert_eq!(
            user.software,
            Some(Software {
                name: "cathook".into(),
                friendly: true
            })
        );
    }

    #[test]
    fn user_with_null_optionals() {
        let user: IdentifiedUser = decode_value(json!({
            "username": "anon",
            "verified": false,
            "color": null,
            "groups": null,
            "software": null
        }))
        .unwrap();

        assert_eq!(user.color, None);
        assert!(user.groups.is_empty());
        assert_eq!(user.software, None);
    }

    #[test]
    fn malformed_group_fails_whole_user() {
        let result = decode_value::<IdentifiedUser>(json!({
            "username": "gabe",
            "verified": true,
            "color": null,
            "groups": [{ "name": "ok", "display": null }, { "display": "no name" }],
            "software": null
        }));
        assert!(result.is_err());
    }

    #[test]
    fn user_group_keyed_by_numeric_id() {
        let group: IdentifiedUserGroup = decode_value(json!({
            "76561197960287930": user_json("first"),
            "12": user_json("second")
        }))
        .unwrap();

        assert_eq!(group.len(), 2);
        assert_eq!(group.get(76_561_197_960_287_930).unwrap().username, "first");
        assert_eq!(group.get(12).unwrap().username, "second");
    }

    #[test]
    fn user_group_stops_at_first_non_numeric_key() {
        let body = r#"{
            "76561197960287930": {"username":"first","verified":true,"color":null,"groups":[],"software":null},
            "not_a_number": {"username":"second","verified":true,"color":null,"groups":[],"software":null}
        }"#;

        let group: IdentifiedUserGroup = decode(body).unwrap();

        assert_eq!(group.len(), 1);
        assert!(group.contains(76_561_197_960_287_930));
    }

    #[test]
    fn user_group_reads_keys_in_sorted_order() {
        let body = r#"{
            "not_a_number": {"username":"first","verified":true,"color":null,"groups":[],"software":null},
            "12": {"username":"second","verified":true,"color":null,"groups":[],"software":null}
        }"#;

        let group: IdentifiedUserGroup = decode(body).unwrap();

        assert_eq!(group.len(), 1);
        assert!(group.contains(12));
    }

    #[test]
    fn user_group_stop_applies_to_keys_sorting_between_ids() {
        // "10" < "1x" < "2" as strings.
        let group: IdentifiedUserGroup = decode_value(json!({
            "2": user_json("third"),
            "1x": user_json("second"),
            "10": user_json("first")
        }))
        .unwrap();

        assert_eq!(group.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn user_group_ignores_values_after_the_stop() {
        let group: IdentifiedUserGroup = decode_value(json!({
            "1": user_json("first"),
            "a": user_json("second"),
            "b": { "username": 3 }
        }))
        .unwrap();

        assert_eq!(group.len(), 1);
        assert_eq!(group.get(1).unwrap().username, "first");
    }

    #[test]
    fn user_group_with_malformed_user_fails() {
        let result = decode::<IdentifiedUserGroup>(r#"{"1": {"username": "x"}}"#);
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn empty_object_is_empty_group() {
        let group: IdentifiedUserGroup = decode("{}").unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn logged_in_user_ignores_extra_fields() {
        let user: LoggedInUser = decode(r#"{"username":"gabe","id":3}"#).unwrap();
        assert_eq!(user.username, "gabe");
    }

    #[test]
    fn invalid_json_keeps_body() {
        let Err(Error::Deserialization { body, .. }) = decode::<LoggedInUser>("<html>") else {
            panic!("expected a deserialization error");
        };
        assert_eq!(body, "<html>");
    }
}
