//! Cached document list
//!
//! Mutations are applied locally first and sent to the server afterwards.
//! When the server call fails the local change is undone and the error is
//! returned; nothing is refetched after a mutation.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::DocumentsApi;
use crate::error::{ClientError, Result};
use crate::types::DocumentItem;

pub struct DocumentStore {
    api: Arc<dyn DocumentsApi>,
    /// Without a user the store is local-only
    user_id: Option<String>,
    documents: RwLock<Vec<DocumentItem>>,
}

impl DocumentStore {
    pub fn new(api: Arc<dyn DocumentsApi>, user_id: Option<String>) -> Self {
        Self {
            api,
            user_id: user_id.filter(|u| !u.trim().is_empty()),
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Snapshot of the list, newest first
    pub async fn documents(&self) -> Vec<DocumentItem> {
        self.documents.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<DocumentItem> {
        self.documents.read().await.iter().find(|d| d.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Replace the list with the server's. No-op without a user.
    pub async fn refresh(&self) -> Result<usize> {
        let Some(ref user_id) = self.user_id else {
            return Ok(self.len().await);
        };

        let documents = self.api.list_documents(user_id).await?;
        let count = documents.len();
        *self.documents.write().await = documents;

        tracing::debug!(count, "Document list refreshed");
        Ok(count)
    }

    /// Insert a freshly converted document at the top of the list
    pub async fn add_local(&self, item: DocumentItem) {
        let mut documents = self.documents.write().await;
        documents.retain(|d| d.id != item.id);
        documents.insert(0, item);
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let previous = {
            let mut documents = self.documents.write().await;
            let item = documents
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
            std::mem::replace(&mut item.name, name.to_string())
        };

        let Some(ref user_id) = self.user_id else {
            return Ok(());
        };

        if let Err(e) = self.api.rename_document(user_id, id, name).await {
            tracing::warn!(id, "Rename failed, restoring previous name: {}", e);
            let mut documents = self.documents.write().await;
            if let Some(item) = documents.iter_mut().find(|d| d.id == id) {
                item.name = previous;
            }
            return Err(e);
        }

        Ok(())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let (index, removed) = {
            let mut documents = self.documents.write().await;
            let index = documents
                .iter()
                .position(|d| d.id == id)
                .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
            (index, documents.remove(index))
        };

        let Some(ref user_id) = self.user_id else {
            return Ok(());
        };

        if let Err(e) = self.api.delete_document(user_id, id).await {
            tracing::warn!(id, "Delete failed, restoring document: {}", e);
            let mut documents = self.documents.write().await;
            let index = index.min(documents.len());
            documents.insert(index, removed);
            return Err(e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory server stand-in
    #[derive(Default)]
    pub struct FakeApi {
        pub documents: Mutex<Vec<DocumentItem>>,
        pub fail_with: Option<u16>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn failing(status: u16) -> Self {
            Self {
                fail_with: Some(status),
                ..Default::default()
            }
        }

        fn check(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with {
                Some(status) => Err(ClientError::Server {
                    status,
                    message: "boom".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl DocumentsApi for FakeApi {
        async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentItem>> {
            self.check(format!("list {}", user_id))?;
            Ok(self.documents.lock().unwrap().clone())
        }

        async fn rename_document(
            &self,
            user_id: &str,
            id: &str,
            name: &str,
        ) -> Result<DocumentItem> {
            self.check(format!("rename {} {} {}", user_id, id, name))?;
            let mut documents = self.documents.lock().unwrap();
            let item = documents
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| ClientError::Server {
                    status: 404,
                    message: "Document not found".to_string(),
                })?;
            item.name = name.to_string();
            Ok(item.clone())
        }

        async fn delete_document(&self, user_id: &str, id: &str) -> Result<()> {
            self.check(format!("delete {} {}", user_id, id))?;
            self.documents.lock().unwrap().retain(|d| d.id != id);
            Ok(())
        }
    }

    fn item(id: &str, name: &str) -> DocumentItem {
        DocumentItem {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("http://localhost:3000/files/{}.docx", id),
            uploaded_at: String::new(),
            text: String::new(),
        }
    }

    async fn seeded(api: Arc<FakeApi>, user: Option<&str>) -> DocumentStore {
        let store = DocumentStore::new(api, user.map(str::to_string));
        store.add_local(item("1", "first")).await;
        store.add_local(item("2", "second")).await;
        store.add_local(item("3", "third")).await;
        store
    }

    fn names(documents: &[DocumentItem]) -> Vec<&str> {
        documents.iter().map(|d| d.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_local_puts_newest_first() {
        let store = seeded(Arc::new(FakeApi::default()), None).await;
        assert_eq!(names(&store.documents().await), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_list() {
        let api = Arc::new(FakeApi::default());
        api.documents.lock().unwrap().push(item("9", "server copy"));

        let store = seeded(api.clone(), Some("u1")).await;
        assert_eq!(store.refresh().await.unwrap(), 1);
        assert_eq!(names(&store.documents().await), vec!["server copy"]);
    }

    #[tokio::test]
    async fn test_refresh_without_user_is_noop() {
        let api = Arc::new(FakeApi::default());
        let store = seeded(api.clone(), None).await;

        assert_eq!(store.refresh().await.unwrap(), 3);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_success_keeps_new_name() {
        let api = Arc::new(FakeApi::default());
        api.documents.lock().unwrap().push(item("2", "second"));
        let store = seeded(api.clone(), Some("u1")).await;

        store.rename("2", "Invoice").await.unwrap();

        assert_eq!(store.get("2").await.unwrap().name, "Invoice");
        assert_eq!(api.calls.lock().unwrap().as_slice(), ["rename u1 2 Invoice"]);
    }

    #[tokio::test]
    async fn test_failed_rename_restores_previous_list() {
        let store = seeded(Arc::new(FakeApi::failing(500)), Some("u1")).await;
        let before = store.documents().await;

        let err = store.rename("2", "Invoice").await.unwrap_err();

        assert!(matches!(err, ClientError::Server { status: 500, .. }));
        assert_eq!(store.documents().await, before);
    }

    #[tokio::test]
    async fn test_failed_remove_restores_previous_list() {
        let store = seeded(Arc::new(FakeApi::failing(404)), Some("u1")).await;
        let before = store.documents().await;

        let err = store.remove("2").await.unwrap_err();

        assert!(matches!(err, ClientError::Server { status: 404, .. }));
        assert_eq!(store.documents().await, before);
    }

    #[tokio::test]
    async fn test_remove_success() {
        let api = Arc::new(FakeApi::default());
        let store = seeded(api.clone(), Some("u1")).await;

        store.remove("1").await.unwrap();

        assert_eq!(names(&store.documents().await), vec!["third", "second"]);
        assert_eq!(api.calls.lock().unwrap().as_slice(), ["delete u1 1"]);
    }

    #[tokio::test]
    async fn test_local_only_mutations_skip_server() {
        let api = Arc::new(FakeApi::failing(500));
        let store = seeded(api.clone(), None).await;

        store.rename("1", "renamed").await.unwrap();
        store.remove("3").await.unwrap();

        assert_eq!(names(&store.documents().await), vec!["second", "renamed"]);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = seeded(Arc::new(FakeApi::default()), Some("u1")).await;

        assert!(matches!(
            store.rename("missing", "x").await,
            Err(ClientError::NotFound(_))
        ));
        assert!(matches!(store.remove("missing").await, Err(ClientError::NotFound(_))));
    }
}
