//! Document repository for collection CRUD operations.
//!
//! Bodies are stored as JSON text; the public `id` lives in its own column and
//! is injected on every read.

use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Collection, Document, ID_FIELD};

/// Merge/insert rounds before an upsert gives up.
const UPSERT_ATTEMPTS: usize = 3;

/// Path/value pairs per `json_set` call, below SQLite's default 127-argument cap.
const MERGE_PAIRS_PER_CALL: usize = 60;

/// Document store over the shared SQLite pool.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all documents of a collection in insertion order.
    pub async fn list(&self, collection: Collection) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY seq")
            .bind(collection.name())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// List all documents sorted by `field` descending, newest insertion first on ties.
    pub async fn list_newest_first(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = ? ORDER BY json_extract(body, ?) DESC, seq DESC",
        )
        .bind(collection.name())
        .bind(json_path(field))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Get a document by ID. Malformed IDs never match.
    pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, AppError> {
        let Some(key) = parse_key(id) else {
            return Ok(None);
        };

        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.name())
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Find the first document whose top-level `field` equals `value`.
    pub async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = ? AND json_extract(body, ?) = ? ORDER BY seq LIMIT 1",
        )
        .bind(collection.name())
        .bind(json_path(field))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Insert a new document and return its generated ID.
    pub async fn insert(&self, collection: Collection, fields: &Document) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(&strip_id(fields.clone()))?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection.name())
            .bind(&id)
            .bind(&body)
            .execute(&self.pool)
            .await?;

        tracing::debug!(collection = collection.name(), %id, "Inserted document");
        Ok(id)
    }

    /// Merge `fields` into an existing document. Returns `false` if nothing matched.
    ///
    /// The merge runs as one `UPDATE` so concurrent writers queue on the
    /// database lock instead of failing on a stale read snapshot.
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: &Document,
    ) -> Result<bool, AppError> {
        let Some(key) = parse_key(id) else {
            return Ok(false);
        };

        let (set_expr, binds) = merge_expression(fields)?;
        let sql = format!(
            "UPDATE documents SET body = {} WHERE collection = ? AND id = ?",
            set_expr
        );

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let result = query
            .bind(collection.name())
            .bind(&key)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected() > 0;
        if matched {
            tracing::debug!(collection = collection.name(), id = %key, "Updated document");
        }
        Ok(matched)
    }

    /// Delete a document. Returns `false` if nothing matched.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        let Some(key) = parse_key(id) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.name())
            .bind(&key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a document keyed by `field == value`, or merge into the existing one.
    ///
    /// Returns `true` when a new document was inserted.
    pub async fn upsert_by(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        fields: &Document,
    ) -> Result<bool, AppError> {
        let (set_expr, binds) = merge_expression(fields)?;
        let sql = format!(
            "UPDATE documents SET body = {} WHERE id = \
             (SELECT id FROM documents WHERE collection = ? AND json_extract(body, ?) = ? ORDER BY seq LIMIT 1)",
            set_expr
        );

        // A concurrent delete can slip between the merge and the insert.
        for _ in 0..UPSERT_ATTEMPTS {
            let mut query = sqlx::query(&sql);
            for bind in &binds {
                query = query.bind(bind.as_str());
            }
            let result = query
                .bind(collection.name())
                .bind(json_path(field))
                .bind(value)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() > 0 {
                return Ok(false);
            }

            if self
                .insert_if_absent(collection, field, value, fields)
                .await?
                .is_some()
            {
                return Ok(true);
            }
        }

        Err(AppError::Database(format!(
            "Upsert of {} where {} = {} did not settle",
            collection.name(),
            field,
            value
        )))
    }

    /// Insert a document unless one with top-level `field == value` already exists.
    ///
    /// Returns the generated ID, or `None` when a matching document was found.
    pub async fn insert_if_absent(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        fields: &Document,
    ) -> Result<Option<String>, AppError> {
        let id = Uuid::new_v4().to_string();
        let mut doc = strip_id(fields.clone());
        doc.insert(field.to_string(), Value::String(value.to_string()));

        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body) SELECT ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM documents WHERE collection = ? AND json_extract(body, ?) = ?)",
        )
        .bind(collection.name())
        .bind(&id)
        .bind(serde_json::to_string(&doc)?)
        .bind(collection.name())
        .bind(json_path(field))
        .bind(value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::debug!(collection = collection.name(), %id, "Inserted document");
        Ok(Some(id))
    }

    /// Count all documents of a collection.
    pub async fn count(&self, collection: Collection) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE collection = ?")
            .bind(collection.name())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Count documents whose top-level `field` equals `value`.
    pub async fn count_where(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM documents WHERE collection = ? AND json_extract(body, ?) = ?",
        )
        .bind(collection.name())
        .bind(json_path(field))
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }
}

/// Normalize a public identifier, rejecting anything that is not a UUID.
fn parse_key(id: &str) -> Option<String> {
    Uuid::parse_str(id).ok().map(|uuid| uuid.to_string())
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field)
}

fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

/// Build a `json_set` expression for a shallow merge of `fields` into `body`.
///
/// Supplied top-level fields replace stored ones, others are untouched.
/// Returns the SQL fragment and its bind values in order.
fn merge_expression(fields: &Document) -> Result<(String, Vec<String>), AppError> {
    let pairs: Vec<(&String, &Value)> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != ID_FIELD)
        .collect();

    let mut expr = String::from("body");
    let mut binds = Vec::with_capacity(pairs.len() * 2);

    // Wider bodies nest calls: json_set(json_set(body, ...), ...)
    for chunk in pairs.chunks(MERGE_PAIRS_PER_CALL) {
        expr = format!("json_set({}{})", expr, ", ?, json(?)".repeat(chunk.len()));
        for (key, value) in chunk {
            binds.push(json_path(key));
            binds.push(serde_json::to_string(value)?);
        }
    }

    Ok((expr, binds))
}

fn document_from_row(row: &SqliteRow) -> Result<Document, AppError> {
    let id: String = row.get("id");
    let body: String = row.get("body");
    let mut doc: Document = serde_json::from_str(&body)?;
    doc.insert(ID_FIELD.to_string(), Value::String(id));
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use serde_json::json;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_get_injects_id() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Teams, &doc(json!({ "name": "Alpha", "id": "spoofed" })))
            .await
            .unwrap();

        let found = repo.get(Collection::Teams, &id).await.unwrap().unwrap();
        assert_eq!(found["id"], id.as_str());
        assert_eq!(found["name"], "Alpha");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Teams, &doc(json!({ "name": "Alpha" })))
            .await
            .unwrap();

        assert!(repo.get(Collection::Alerts, &id).await.unwrap().is_none());
        assert_eq!(repo.list(Collection::Alerts).await.unwrap().len(), 0);
        assert_eq!(repo.list(Collection::Teams).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_shallow_merge() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(
                Collection::Resources,
                &doc(json!({ "name": "Boats", "quantity": 25, "meta": { "a": 1, "b": 2 } })),
            )
            .await
            .unwrap();

        let matched = repo
            .update(
                Collection::Resources,
                &id,
                &doc(json!({ "quantity": 18, "meta": { "a": 9 } })),
            )
            .await
            .unwrap();
        assert!(matched);

        let found = repo.get(Collection::Resources, &id).await.unwrap().unwrap();
        assert_eq!(found["name"], "Boats");
        assert_eq!(found["quantity"], 18);
        assert_eq!(found["meta"], json!({ "a": 9 }));
    }

    #[tokio::test]
    async fn test_malformed_and_missing_ids_never_match() {
        let (repo, _dir) = repo().await;
        let missing = Uuid::new_v4().to_string();

        assert!(repo.get(Collection::Alerts, "not-a-key").await.unwrap().is_none());
        assert!(!repo
            .update(Collection::Alerts, "not-a-key", &Document::new())
            .await
            .unwrap());
        assert!(!repo.delete(Collection::Alerts, &missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Alerts, &doc(json!({ "title": "Flood" })))
            .await
            .unwrap();

        assert!(repo.delete(Collection::Alerts, &id).await.unwrap());
        assert!(!repo.delete(Collection::Alerts, &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (repo, _dir) = repo().await;

        for ts in ["2024-12-15T10:00:00Z", "2024-12-15T14:30:00Z", "2024-12-15T12:00:00Z"] {
            repo.insert(Collection::Messages, &doc(json!({ "timestamp": ts })))
                .await
                .unwrap();
        }

        let listed = repo
            .list_newest_first(Collection::Messages, "timestamp")
            .await
            .unwrap();
        let order: Vec<&str> = listed
            .iter()
            .map(|m| m["timestamp"].as_str().unwrap())
            .collect();

        assert_eq!(
            order,
            vec!["2024-12-15T14:30:00Z", "2024-12-15T12:00:00Z", "2024-12-15T10:00:00Z"]
        );
    }

    #[tokio::test]
    async fn test_upsert_by_inserts_then_merges() {
        let (repo, _dir) = repo().await;

        let inserted = repo
            .upsert_by(
                Collection::Weather,
                "location",
                "Delhi",
                &doc(json!({ "location": "Delhi", "temperature": 28, "humidity": 65 })),
            )
            .await
            .unwrap();
        assert!(inserted);

        let inserted = repo
            .upsert_by(
                Collection::Weather,
                "location",
                "Delhi",
                &doc(json!({ "location": "Delhi", "temperature": 31 })),
            )
            .await
            .unwrap();
        assert!(!inserted);

        assert_eq!(repo.count(Collection::Weather).await.unwrap(), 1);
        let record = repo
            .find_one(Collection::Weather, "location", "Delhi")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["temperature"], 31);
        assert_eq!(record["humidity"], 65);
    }

    #[tokio::test]
    async fn test_update_ignores_id_and_accepts_empty_body() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Teams, &doc(json!({ "name": "Alpha", "status": "ready" })))
            .await
            .unwrap();

        assert!(repo
            .update(Collection::Teams, &id, &doc(json!({ "id": "spoofed", "status": "deployed" })))
            .await
            .unwrap());
        assert!(repo.update(Collection::Teams, &id, &Document::new()).await.unwrap());

        let found = repo.get(Collection::Teams, &id).await.unwrap().unwrap();
        assert_eq!(found["id"], id.as_str());
        assert_eq!(found["status"], "deployed");
        assert_eq!(found["name"], "Alpha");
    }

    #[tokio::test]
    async fn test_update_with_many_fields() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Teams, &doc(json!({ "name": "Alpha" })))
            .await
            .unwrap();

        let wide: Document = (0..150)
            .map(|i| (format!("field{}", i), json!(i)))
            .collect();
        assert!(repo.update(Collection::Teams, &id, &wide).await.unwrap());

        let found = repo.get(Collection::Teams, &id).await.unwrap().unwrap();
        assert_eq!(found["name"], "Alpha");
        assert_eq!(found["field0"], 0);
        assert_eq!(found["field149"], 149);
        assert_eq!(found.len(), 152);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_all_succeed() {
        let (repo, _dir) = repo().await;

        let id = repo
            .insert(Collection::Resources, &doc(json!({ "name": "Boats", "quantity": 0 })))
            .await
            .unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for quantity in 0..50 {
            let repo = repo.clone();
            let id = id.clone();
            tasks.spawn(async move {
                repo.update(Collection::Resources, &id, &doc(json!({ "quantity": quantity })))
                    .await
            });
        }

        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().unwrap());
        }

        let found = repo.get(Collection::Resources, &id).await.unwrap().unwrap();
        assert_eq!(found["name"], "Boats");
        assert!(found["quantity"].as_i64().unwrap() < 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_keep_one_record() {
        let (repo, _dir) = repo().await;

        let mut tasks = tokio::task::JoinSet::new();
        for temperature in 0..20 {
            let repo = repo.clone();
            tasks.spawn(async move {
                repo.upsert_by(
                    Collection::Weather,
                    "location",
                    "Mumbai",
                    &doc(json!({ "location": "Mumbai", "temperature": temperature })),
                )
                .await
            });
        }

        let mut inserted = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(repo.count(Collection::Weather).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent() {
        let (repo, _dir) = repo().await;
        let user = doc(json!({ "username": "operator1", "role": "Operator" }));

        let first = repo
            .insert_if_absent(Collection::Users, "username", "operator1", &user)
            .await
            .unwrap();
        let second = repo
            .insert_if_absent(Collection::Users, "username", "operator1", &user)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(repo.count(Collection::Users).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_where() {
        let (repo, _dir) = repo().await;

        for status in ["resolved", "responding", "resolved", "investigating"] {
            repo.insert(Collection::Incidents, &doc(json!({ "status": status })))
                .await
                .unwrap();
        }

        assert_eq!(repo.count(Collection::Incidents).await.unwrap(), 4);
        assert_eq!(
            repo.count_where(Collection::Incidents, "status", "resolved")
                .await
                .unwrap(),
            2
        );
    }
}
