use contentblocks_core::{CleanedQuery, Document, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub document: Document,
    pub updated: u64,
}

/// Persistence collaborator behind the content routes.
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync + 'static {
    async fn find(&self, query: &CleanedQuery) -> Result<Vec<Document>>;
    async fn find_one(&self, id: &str) -> Result<Document>;
    // Returns the stored document, `_id` included.
    async fn save(&self, doc: Document) -> Result<Document>;
    async fn update(&self, id: &str, doc: Document) -> Result<UpdateOutcome>;
    async fn delete(&self, id: &str) -> Result<u64>; // removed count

    fn mode(&self) -> &'static str {
        "memory"
    }
}
