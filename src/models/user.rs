//! Login request and the defaults applied to self-registered users.

use serde::Deserialize;
use serde_json::Value;

use super::{stamp, Collection, Document};

/// Field holding the stored password hash.
pub const PASSWORD_FIELD: &str = "password";

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Build the document stored for a user created on first login.
pub fn new_user_document(username: &str, password_hash: String, now: &str) -> Document {
    let mut doc = Document::new();
    doc.insert("username".into(), Value::String(username.to_string()));
    doc.insert(PASSWORD_FIELD.into(), Value::String(password_hash));
    doc.insert("name".into(), Value::String(username.to_string()));
    doc.insert("role".into(), Value::String("Operator".into()));
    doc.insert(
        "department".into(),
        Value::String("Emergency Operations".into()),
    );
    doc.insert("contact".into(), Value::String("Not provided".into()));
    stamp(&mut doc, Collection::Users.create_stamps(), now);
    doc
}

/// Remove the password field before a user record leaves the service.
pub fn redact(mut doc: Document) -> Document {
    doc.remove(PASSWORD_FIELD);
    doc
}
