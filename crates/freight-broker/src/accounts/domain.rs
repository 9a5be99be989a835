use std::fmt;

use serde::{Deserialize, Serialize};

use crate::brokerage::domain::{
    assign, explicit, require_email, require_text, EntityKind, ValidationError,
};
use crate::brokerage::lifecycle::Vocabulary;
use crate::store::{KeyScheme, Record, RecordKey, Timestamps, UniqueField};

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Broker,
    #[default]
    User,
}

impl Vocabulary for UserRole {
    const ENTITY: EntityKind = EntityKind::User;
    const FIELD: &'static str = "role";
    const ALL: &'static [Self] = &[Self::Admin, Self::Broker, Self::User];
    const LABELS: &'static [&'static str] = &["admin", "broker", "user"];

    fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Broker => "broker",
            Self::User => "user",
        }
    }
}

/// Stored account. `password_hash` is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;
    const KEY_SCHEME: KeyScheme = KeyScheme::Opaque;

    fn key(&self) -> RecordKey {
        RecordKey::Opaque(self.id.clone())
    }

    fn assign_key(&mut self, key: RecordKey) {
        if let RecordKey::Opaque(id) = key {
            self.id = id;
        }
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn unique_fields(&self) -> Vec<UniqueField> {
        vec![
            UniqueField::new("username", self.username.trim()),
            UniqueField::new("email", self.email.trim().to_ascii_lowercase()),
        ]
    }
}

/// Registration payload.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl NewUser {
    /// Checks the payload and builds the row around an already hashed password.
    pub(crate) fn into_user(self, password_hash: String) -> Result<User, ValidationError> {
        let role = match self.role {
            Some(raw) => UserRole::parse(&raw)?,
            None => UserRole::default(),
        };
        let user = User {
            id: String::new(),
            username: self.username.trim().to_string(),
            password_hash,
            email: self.email.trim().to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
            role,
            timestamps: Timestamps::default(),
        };
        require_text("username", &user.username)?;
        require_email("email", &user.email)?;
        Ok(user)
    }
}

pub(crate) fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err(ValidationError::input(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ))
    } else {
        Ok(())
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub profile_image_url: Option<Option<String>>,
    pub role: Option<String>,
}

impl fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPatch")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl UserPatch {
    /// Applies everything except the password, which the caller hashes.
    pub(crate) fn apply_profile(self, user: &mut User) -> Result<(), ValidationError> {
        if let Some(raw) = self.role {
            user.role = UserRole::parse(&raw)?;
        }
        if let Some(username) = self.username {
            require_text("username", &username)?;
            user.username = username.trim().to_string();
        }
        if let Some(email) = self.email {
            require_email("email", &email)?;
            user.email = email.trim().to_string();
        }
        assign(&mut user.first_name, self.first_name);
        assign(&mut user.last_name, self.last_name);
        assign(&mut user.profile_image_url, self.profile_image_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> NewUser {
        NewUser {
            username: " dispatcher ".to_string(),
            password: "correct horse".to_string(),
            email: "ops@everflown.test".to_string(),
            ..NewUser::default()
        }
    }

    #[test]
    fn role_defaults_to_user() {
        let user = registration()
            .into_user("$argon2id$stub".to_string())
            .expect("valid registration");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.username, "dispatcher");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let draft = NewUser {
            role: Some("superuser".to_string()),
            ..registration()
        };
        match draft.into_user(String::new()) {
            Err(ValidationError::InvalidInput { field, .. }) => assert_eq!(field, "role"),
            other => panic!("expected invalid role, got {other:?}"),
        }
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = registration()
            .into_user("$argon2id$secret".to_string())
            .expect("valid registration");
        let json = serde_json::to_value(&user).expect("serializes");
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let mut user = registration()
            .into_user(String::new())
            .expect("valid registration");
        user.email = "Ops@EverFlown.test".to_string();
        assert!(user
            .unique_fields()
            .contains(&UniqueField::new("email", "ops@everflown.test")));
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let rendered = format!("{:?}", registration());
        assert!(!rendered.contains("correct horse"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password("short").is_err());
        assert!(check_password("long enough").is_ok());
    }

    #[test]
    fn display_name_prefers_real_names() {
        let mut user = registration()
            .into_user(String::new())
            .expect("valid registration");
        assert_eq!(user.display_name(), "dispatcher");
        user.first_name = Some("Pat".to_string());
        user.last_name = Some("Lee".to_string());
        assert_eq!(user.display_name(), "Pat Lee");
    }
}
