use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Conta de usuário (collection "users")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    /// Único, sempre trim + lowercase
    pub email: String,
    /// Hash bcrypt
    pub password: String,
    #[serde(default)]
    pub confirmed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: ObjectId::new(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password_hash,
            confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public projection of a user: never exposes the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_unconfirmed_and_normalized() {
        let user = User::new(" Ana ", "  Ana@Example.COM ", "hash".into());
        assert!(!user.confirmed);
        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@example.com");
    }

    #[test]
    fn test_summary_hides_password() {
        let user = User::new("Ana", "ana@example.com", "secret-hash".into());
        let json = serde_json::to_value(UserSummary::from(&user)).unwrap();
        assert_eq!(json["email"], "ana@example.com");
        assert!(json.get("password").is_none());
        assert_eq!(json["id"], user.id.to_hex());
    }
}
