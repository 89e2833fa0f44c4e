//! Documents database operations

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// Document record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub file_name: String,
    pub text: String,
    pub uploaded_at: String,
}

/// Create document request
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub user_id: &'a str,
    pub name: Option<&'a str>,
    pub url: &'a str,
    pub file_name: &'a str,
    pub text: &'a str,
}

/// `document <YYYY-MM-DD>`
pub fn default_document_name(at: DateTime<Utc>) -> String {
    format!("document {}", at.format("%Y-%m-%d"))
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a document owned by `user_id`
    pub async fn get(&self, id: &str, user_id: &str) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, name, url, file_name, text, uploaded_at
            FROM documents
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// List a user's documents, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, name, url, file_name, text, uploaded_at
            FROM documents
            WHERE user_id = ?
            ORDER BY uploaded_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    /// Record a newly generated document
    pub async fn create(&self, data: &NewDocument<'_>) -> Result<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            user_id: data.user_id.to_string(),
            name: data
                .name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_document_name(now)),
            url: data.url.to_string(),
            file_name: data.file_name.to_string(),
            text: data.text.to_string(),
            uploaded_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, name, url, file_name, text, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.user_id)
        .bind(&document.name)
        .bind(&document.url)
        .bind(&document.file_name)
        .bind(&document.text)
        .bind(&document.uploaded_at)
        .execute(self.pool)
        .await?;

        Ok(document)
    }

    /// Rename a document, returning the updated record
    pub async fn rename(&self, id: &str, user_id: &str, name: &str) -> Result<Option<Document>> {
        let result = sqlx::query("UPDATE documents SET name = ? WHERE id = ? AND user_id = ?")
            .bind(name)
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id, user_id).await
    }

    /// Delete a document, returning the removed record
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<Option<Document>> {
        let Some(document) = self.get(id, user_id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM documents WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use tempfile::TempDir;

    async fn pool(dir: &TempDir) -> SqlitePool {
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        create_pool(&url).await.unwrap()
    }

    fn new_doc<'a>(user_id: &'a str, name: Option<&'a str>, file_name: &'a str) -> NewDocument<'a> {
        NewDocument {
            user_id,
            name,
            url: "http://localhost:3000/files/x.docx",
            file_name,
            text: "hello",
        }
    }

    #[tokio::test]
    async fn test_create_uses_default_name() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        let doc = repo.create(&new_doc("u1", None, "1.docx")).await.unwrap();
        assert_eq!(doc.name, default_document_name(Utc::now()));
        assert!(doc.name.starts_with("document "));

        let named = repo.create(&new_doc("u1", Some("  Receipt "), "2.docx")).await.unwrap();
        assert_eq!(named.name, "Receipt");
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        let first = repo.create(&new_doc("u1", Some("a"), "1.docx")).await.unwrap();
        let second = repo.create(&new_doc("u1", Some("b"), "2.docx")).await.unwrap();
        repo.create(&new_doc("u2", Some("c"), "3.docx")).await.unwrap();

        let listed = repo.list_for_user("u1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_rename_and_delete_respect_owner() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        let doc = repo.create(&new_doc("u1", None, "1.docx")).await.unwrap();

        assert!(repo.rename(&doc.id, "u2", "stolen").await.unwrap().is_none());
        let renamed = repo.rename(&doc.id, "u1", "Invoice").await.unwrap().unwrap();
        assert_eq!(renamed.name, "Invoice");

        assert!(repo.delete(&doc.id, "u2").await.unwrap().is_none());
        let deleted = repo.delete(&doc.id, "u1").await.unwrap().unwrap();
        assert_eq!(deleted.file_name, "1.docx");
        assert!(repo.get(&doc.id, "u1").await.unwrap().is_none());
    }
}
