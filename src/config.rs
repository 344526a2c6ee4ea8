use std::env;
use std::str::FromStr;

/// Runtime configuration, read once at startup from the environment (`.env` included)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// MongoDB URI, or `memory://` for the in-process store
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    /// Base URL of the SPA; used in email links and as the CORS origin
    pub frontend_url: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP mail relay endpoint; emails are only logged when unset
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("{} must be set", name))
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let bcrypt_cost = parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(format!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost));
        }

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parsed("PORT", 4000)?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_days: parsed("JWT_EXPIRY_DAYS", 180)?,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
            token_ttl_minutes: parsed("TOKEN_TTL_MINUTES", 10)?,
            bcrypt_cost,
            mail: MailConfig {
                api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
                api_key: env::var("MAIL_API_KEY").ok().filter(|v| !v.is_empty()),
                from: var_or("MAIL_FROM", "UpTask <admin@uptask.com>"),
            },
        })
    }

    /// Cheap settings for unit and end-to-end tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "memory://".into(),
            jwt_secret: "test-secret".into(),
            jwt_expiry_days: 1,
            frontend_url: "http://localhost:5173".into(),
            token_ttl_minutes: 10,
            bcrypt_cost: 4,
            mail: MailConfig {
                api_url: None,
                api_key: None,
                from: "UpTask <admin@uptask.com>".into(),
            },
        }
    }
}
