use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::token::generate_token;

/// Código de confirmação / reset (collection "tokens")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub token: String,
    pub user: ObjectId,
    /// BSON date so the TTL index can purge it
    pub created_at: BsonDateTime,
}

impl Token {
    pub fn issue(user: ObjectId) -> Self {
        Self::with_value(user, generate_token())
    }

    pub fn with_value(user: ObjectId, token: String) -> Self {
        Self {
            id: ObjectId::new(),
            token,
            user,
            created_at: BsonDateTime::now(),
        }
    }
}

/// Oldest creation time still accepted for a token with the given lifetime
pub fn token_cutoff(ttl_minutes: i64) -> BsonDateTime {
    BsonDateTime::from_millis(BsonDateTime::now().timestamp_millis() - ttl_minutes * 60_000)
}
