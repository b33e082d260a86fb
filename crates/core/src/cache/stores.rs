//! Cache store operations on SQLite.
//!
//! Provides `CacheStorage` for `CacheDb`: store creation, enumeration and
//! deletion, plus entry lookup and atomic bulk insertion.

use super::connection::CacheDb;
use super::entry::{CacheRequest, CachedResponse};
use super::storage::CacheStorage;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Create a store if it doesn't exist yet.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &name, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store. Its entries go with it through the foreign key cascade.
    ///
    /// Returns whether a store was deleted.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry stored for a request.
    ///
    /// Returns None if the store or the entry doesn't exist.
    pub async fn get_entry(&self, name: &str, request: &CacheRequest) -> Result<Option<CachedResponse>, Error> {
        let name = name.to_string();
        let key_hash = request.cache_key();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status_code, headers_json, body, stored_at
                    FROM cache_entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![name, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                });

                let (url, status, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;

                Ok(Some(CachedResponse { url, status, headers, body, stored_at }))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert entries into a store in one transaction, creating the store if
    /// needed. Existing entries for the same request are replaced.
    pub async fn put_entries(&self, name: &str, entries: Vec<(CacheRequest, CachedResponse)>) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let rows = entries
            .into_iter()
            .map(|(request, response)| {
                let headers_json = serde_json::to_string(&response.headers)
                    .map_err(|e| Error::CorruptEntry(format!("{}: {e}", response.url)))?;
                Ok((request, response, headers_json))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO cache_entries (
                        store_name, key_hash, method, url, status_code, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status_code = excluded.status_code,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    )?;

                    for (request, response, headers_json) in &rows {
                        stmt.execute(params![
                            &name,
                            request.cache_key(),
                            &request.method,
                            &request.url,
                            response.status,
                            headers_json,
                            &response.body,
                            &response.stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in a store.
    pub async fn count_entries(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE store_name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

fn ensure_store(conn: &rusqlite::Connection, name: &str, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO cache_stores (name, created_at, seq)
        VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM cache_stores))
        ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    Ok(())
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_store(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_store(name).await
    }

    async fn match_request(&self, name: &str, request: &CacheRequest) -> Result<Option<CachedResponse>, Error> {
        self.get_entry(name, request).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(CacheRequest, CachedResponse)>) -> Result<(), Error> {
        self.put_entries(name, entries).await
    }

    async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        self.count_entries(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_entry(url: &str, body: &str) -> (CacheRequest, CachedResponse) {
        let request = CacheRequest::get(url);
        let response = CachedResponse {
            url: url.to_string(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: body.as_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        };
        (request, response)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (request, response) = make_test_entry("http://localhost:3000/index.html", "<h1>hi</h1>");

        db.put_entries("v1", vec![(request.clone(), response.clone())]).await.unwrap();

        let retrieved = db.get_entry("v1", &request).await.unwrap().unwrap();
        assert_eq!(retrieved, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();

        let request = CacheRequest::get("http://localhost:3000/nope");
        assert!(db.get_entry("v1", &request).await.unwrap().is_none());
        assert!(db.get_entry("absent", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_scoped_to_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (request, response) = make_test_entry("http://localhost:3000/", "old");
        db.put_entries("v1", vec![(request.clone(), response)]).await.unwrap();
        db.open_store("v2").await.unwrap();

        assert!(db.get_entry("v2", &request).await.unwrap().is_none());
        assert_eq!(db.count_entries("v1").await.unwrap(), 1);
        assert_eq!(db.count_entries("v2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_method_distinguishes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (request, response) = make_test_entry("http://localhost:3000/", "page");
        db.put_entries("v1", vec![(request, response)]).await.unwrap();

        let post = CacheRequest::new("POST", "http://localhost:3000/");
        assert!(db.get_entry("v1", &post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (request, first) = make_test_entry("http://localhost:3000/", "first");
        let (_, second) = make_test_entry("http://localhost:3000/", "second");

        db.put_entries("v1", vec![(request.clone(), first)]).await.unwrap();
        db.put_entries("v1", vec![(request.clone(), second.clone())]).await.unwrap();

        assert_eq!(db.count_entries("v1").await.unwrap(), 1);
        assert_eq!(db.get_entry("v1", &request).await.unwrap().unwrap().body, second.body);
    }

    #[tokio::test]
    async fn test_store_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("b").await.unwrap();
        db.open_store("a").await.unwrap();
        db.open_store("b").await.unwrap();

        assert_eq!(db.store_names().await.unwrap(), vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (request, response) = make_test_entry("http://localhost:3000/", "page");
        db.put_entries("v1", vec![(request.clone(), response)]).await.unwrap();

        assert!(db.delete_store("v1").await.unwrap());
        assert!(!db.delete_store("v1").await.unwrap());
        assert!(db.store_names().await.unwrap().is_empty());
        assert_eq!(db.count_entries("v1").await.unwrap(), 0);

        db.open_store("v1").await.unwrap();
        assert!(db.get_entry("v1", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let storage: &dyn CacheStorage = &db;
        storage.open("v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
        assert_eq!(storage.entry_count("v1").await.unwrap(), 0);
    }
}
