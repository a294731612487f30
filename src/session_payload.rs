use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session written by the login, signup and OAuth flows.
///
/// The vault stores any JSON; this is the shape its consumers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
}

impl SessionPayload {
    pub fn new(user: Value, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    /// Token usable in an `Authorization: Bearer` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.user.as_ref()?.get("role")?.as_str()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some("admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_login_payload() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "user": {"id": "u1", "role": "admin"},
            "token": "abc.def.ghi"
        }))
        .unwrap();

        assert_eq!(payload.bearer_token(), Some("abc.def.ghi"));
        assert!(payload.is_admin());
    }

    #[test]
    fn blank_token_is_not_a_bearer_token() {
        let payload = SessionPayload::new(json!({"id": "u2"}), "  ");
        assert_eq!(payload.bearer_token(), None);
        assert_eq!(payload.role(), None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let payload: SessionPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(payload, SessionPayload::default());
    }
}
