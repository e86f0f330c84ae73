//! Who is currently logged in.
//!
//! [`SessionManager`] is the only writer of the session. Screens and the API
//! client hold clones of it and read snapshots via [`SessionManager::get`].

mod manager;
mod store;
#[cfg(test)]
pub mod testing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::manager::{LoginTicket, SessionManager};
pub use self::store::{SessionStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ngo,
    College,
    Admin,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Ngo, Self::College, Self::Admin];

    /// The tag sent to the backend and stored in the vault.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ngo => "ngo",
            Self::College => "college",
            Self::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ngo => "NGO",
            Self::College => "College",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// The record describing whoever logged in. Its shape depends on the role and
/// the backend's mood, so it is kept as raw json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Value);

impl Identity {
    pub fn display_name(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            Value::Object(fields) => ["name", "title", "email"]
                .into_iter()
                .filter_map(|key| fields.get(key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.0.to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub role: Role,
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Identity and access token only ever exist together, inside
/// [`Session::LoggedIn`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(Credentials),
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        self.credentials().map(|c| c.role)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            Self::LoggedOut => None,
            Self::LoggedIn(credentials) => Some(credentials),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials().map(|c| &c.access_token as &str)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// The persisted mirror of a session, exactly as found in the store.
///
/// Every field is optional because a crash or an older client may have left
/// only part of a record behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredSession {
    pub role: Option<String>,
    pub identity: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

pub enum Restored {
    Empty,
    /// Some fields were present, but not enough to log in with.
    Partial,
    Complete(Credentials),
}

impl StoredSession {
    pub fn from_credentials(credentials: &Credentials) -> Result<Self, serde_json::Error> {
        Ok(Self {
            role: Some(credentials.role.as_str().to_string()),
            identity: Some(serde_json::to_string(&credentials.identity)?),
            access_token: Some(credentials.access_token.clone()),
            refresh_token: credentials.refresh_token.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.identity.is_none()
            && self.access_token.is_none()
            && self.refresh_token.is_none()
    }

    pub fn restore(self) -> Restored {
        if self.is_empty() {
            return Restored::Empty;
        }

        let role = self.role.as_deref().and_then(|r| r.parse::<Role>().ok());
        let identity = self
            .identity
            .as_deref()
            .and_then(|i| serde_json::from_str::<Identity>(i).ok());

        match (role, identity, self.access_token) {
            (Some(role), Some(identity), Some(access_token)) => Restored::Complete(Credentials {
                role,
                identity,
                access_token,
                refresh_token: self.refresh_token,
            }),
            _ => Restored::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn roles_round_trip_through_their_tags() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("student".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn identity_display_name_prefers_name_then_title_then_email() {
        let named = Identity(json!({"name": "NGO Alpha", "email": "alpha@ngo.org"}));
        assert_eq!(named.display_name(), "NGO Alpha");

        let titled = Identity(json!({"name": "", "title": "Dean", "email": "dean@uni.edu"}));
        assert_eq!(titled.display_name(), "Dean");

        let mailed = Identity(json!({"email": "root@admin.org"}));
        assert_eq!(mailed.display_name(), "root@admin.org");

        assert_eq!(Identity(json!("plain")).display_name(), "plain");
        assert_eq!(Identity(json!({"id": 7})).display_name(), r#"{"id":7}"#);
    }

    #[test]
    fn only_complete_records_are_restored() {
        let complete = StoredSession {
            role: Some("college".to_string()),
            identity: Some(r#"{"name":"Beta College"}"#.to_string()),
            access_token: Some("tok".to_string()),
            refresh_token: None,
        };
        let Restored::Complete(credentials) = complete.clone().restore() else {
            panic!("complete record was not restored");
        };
        assert_eq!(credentials.role, Role::College);
        assert_eq!(credentials.identity, Identity(json!({"name": "Beta College"})));
        assert_eq!(credentials.refresh_token, None);

        let without_token = StoredSession {
            access_token: None,
            ..complete.clone()
        };
        assert!(matches!(without_token.restore(), Restored::Partial));

        let token_only = StoredSession {
            access_token: Some("tok".to_string()),
            ..StoredSession::default()
        };
        assert!(matches!(token_only.restore(), Restored::Partial));

        let bad_role = StoredSession {
            role: Some("superuser".to_string()),
            ..complete.clone()
        };
        assert!(matches!(bad_role.restore(), Restored::Partial));

        let bad_identity = StoredSession {
            identity: Some("{not json".to_string()),
            ..complete
        };
        assert!(matches!(bad_identity.restore(), Restored::Partial));

        assert!(matches!(StoredSession::default().restore(), Restored::Empty));
    }

    #[test]
    fn stored_form_keeps_every_field() {
        let credentials = Credentials {
            role: Role::Ngo,
            identity: Identity(json!({"name": "NGO Alpha"})),
            access_token: "tok1".to_string(),
            refresh_token: Some("ref1".to_string()),
        };
        let stored = StoredSession::from_credentials(&credentials).unwrap();
        assert_eq!(stored.role.as_deref(), Some("ngo"));
        assert_eq!(stored.refresh_token.as_deref(), Some("ref1"));

        let Restored::Complete(restored) = stored.restore() else {
            panic!("stored credentials were not restored");
        };
        assert_eq!(restored, credentials);
    }
}
