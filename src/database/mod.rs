pub mod memory;
pub mod mongo_store;
pub mod store;

pub use memory::MemoryStore;
pub use store::Store;

use mongodb::{Client, Collection, Database};
use std::sync::Arc;

use crate::config::Config;
use crate::utils::AppResult;

pub const USERS: &str = "users";
pub const TOKENS: &str = "tokens";
pub const PROJECTS: &str = "projects";
pub const TASKS: &str = "tasks";
pub const NOTES: &str = "notes";

const MEMORY_URL: &str = "memory://";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, token_ttl_minutes: i64) -> AppResult<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
            .unwrap_or("uptask");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes(token_ttl_minutes).await?;

        Ok(mongodb)
    }

    /// Creates the indexes the service relies on (unique email, token TTL, lookups)
    async fn ensure_indexes(&self, token_ttl_minutes: i64) -> AppResult<()> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<mongodb::bson::Document>(USERS);
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        // Índice único é obrigatório: sem ele o 409 de email duplicado tem corrida
        users.create_index(unique_email).await?;
        log::info!("   ✅ Index created: users(email) unique");

        let tokens = self.collection::<mongodb::bson::Document>(TOKENS);
        let ttl = std::time::Duration::from_secs((token_ttl_minutes.max(1) * 60) as u64);
        let tokens_ttl = IndexModel::builder()
            .keys(doc! { "createdAt": 1 })
            .options(IndexOptions::builder().expire_after(ttl).build())
            .build();
        match tokens.create_index(tokens_ttl).await {
            Ok(_) => log::info!("   ✅ Index created: tokens(createdAt) TTL {}min", token_ttl_minutes),
            Err(e) => log::warn!("   ⚠️  Could not create tokens TTL index: {}", e),
        }

        // Códigos são procurados só pelo valor: dois iguais vivos misturariam contas
        let unique_token = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        tokens.create_index(unique_token).await?;
        log::info!("   ✅ Index created: tokens(token) unique");

        let lookups: [(&str, mongodb::bson::Document); 4] = [
            (PROJECTS, doc! { "manager": 1 }),
            (PROJECTS, doc! { "team": 1 }),
            (TASKS, doc! { "project": 1 }),
            (NOTES, doc! { "task": 1 }),
        ];
        for (collection, keys) in lookups {
            let index = IndexModel::builder().keys(keys.clone()).build();
            match self
                .collection::<mongodb::bson::Document>(collection)
                .create_index(index)
                .await
            {
                Ok(_) => log::info!("   ✅ Index created: {}({})", collection, keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Opens the store selected by `DATABASE_URL` (`memory://` for an in-process store)
pub async fn connect(config: &Config) -> AppResult<Arc<dyn Store>> {
    if config.database_url.starts_with(MEMORY_URL) {
        log::warn!("⚠️  Using in-memory store: data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = MongoDB::new(&config.database_url, config.token_ttl_minutes).await?;
    log::info!("✅ MongoDB connected successfully");
    Ok(Arc::new(db))
}
