use std::sync::LazyLock;

use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager, cmd};
use serde_json::Value;

use super::DocumentStore;
use crate::{errors::RepoError, keys::KeyContext};

const SCAN_COUNT: usize = 1024;

/// Deletes a unique claim only when it still points at the releasing document.
const RELEASE_UNIQUE_SCRIPT_BODY: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

static RELEASE_UNIQUE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(RELEASE_UNIQUE_SCRIPT_BODY));

/// Document store backed by Redis with the JSON module.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
    service: String,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            service: service.into(),
        }
    }

    /// Open a managed connection to `url`.
    pub async fn connect(url: &str, prefix: impl Into<String>, service: impl Into<String>) -> Result<Self, RepoError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix, service))
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, &self.service)
    }

    /// Document keys of a collection, skipping unique-claim keys.
    async fn document_keys(&self, collection: &str) -> Result<Vec<String>, RepoError> {
        let keys = self.keys();
        let pattern = keys.collection_pattern(collection);
        let unique_prefix = keys.unique_prefix(collection);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut found = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            found.extend(batch.into_iter().filter(|key| !key.starts_with(&unique_prefix)));
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RepoError> {
        let key = self.keys().document(collection, id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = cmd("JSON.GET").arg(&key).query_async(&mut conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), RepoError> {
        let key = self.keys().document(collection, id);
        let payload = serde_json::to_string(document)?;
        let mut conn = self.conn.clone();
        let _: () = cmd("JSON.SET")
            .arg(&key)
            .arg("$")
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RepoError> {
        let key = self.keys().document(collection, id);
        let mut conn = self.conn.clone();
        let removed: i64 = cmd("DEL").arg(&key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Value>, RepoError> {
        let keys = self.document_keys(collection).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        // JSON.MGET with `$` yields one JSON array per key (or nil for vanished keys).
        let raw: Vec<Option<String>> = cmd("JSON.MGET").arg(&keys).arg("$").query_async(&mut conn).await?;
        let mut documents = Vec::with_capacity(raw.len());
        for json in raw.into_iter().flatten() {
            let values: Vec<Value> = serde_json::from_str(&json)?;
            documents.extend(values.into_iter().next());
        }
        Ok(documents)
    }

    async fn count(&self, collection: &str) -> Result<u64, RepoError> {
        Ok(self.document_keys(collection).await?.len() as u64)
    }

    async fn claim_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<Option<String>, RepoError> {
        let key = self.keys().unique(collection, field, value);
        let mut conn = self.conn.clone();
        let claimed: Option<String> = cmd("SET").arg(&key).arg(id).arg("NX").query_async(&mut conn).await?;
        if claimed.is_some() {
            return Ok(None);
        }
        let owner: Option<String> = cmd("GET").arg(&key).query_async(&mut conn).await?;
        match owner {
            Some(owner) if owner != id => Ok(Some(owner)),
            _ => Ok(None),
        }
    }

    async fn release_unique(&self, collection: &str, field: &str, value: &str, id: &str) -> Result<(), RepoError> {
        let key = self.keys().unique(collection, field, value);
        let mut conn = self.conn.clone();
        let _: i64 = RELEASE_UNIQUE_SCRIPT.key(&key).arg(id).invoke_async(&mut conn).await?;
        Ok(())
    }

    async fn lookup_unique(&self, collection: &str, field: &str, value: &str) -> Result<Option<String>, RepoError> {
        let key = self.keys().unique(collection, field, value);
        let mut conn = self.conn.clone();
        Ok(cmd("GET").arg(&key).query_async(&mut conn).await?)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        let mut conn = self.conn.clone();
        let _: String = cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
