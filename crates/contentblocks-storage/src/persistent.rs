use crate::traits::{ContentProvider, UpdateOutcome};
use crate::wal::{Wal, WalRecord};
use crate::InMemoryProvider;
use contentblocks_core::{CleanedQuery, ContentError, Document, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// In-memory provider whose writes are journaled to `<data_dir>/wal`.
pub struct PersistentProvider {
    mem: InMemoryProvider,
    wal: Mutex<Wal>,
    data_dir: PathBuf,
}

impl PersistentProvider {
    pub fn open(data_dir: PathBuf) -> std::io::Result<Self> {
        let wal_dir = data_dir.join("wal");
        let mem = load(&wal_dir)?;
        let wal = Wal::open(&wal_dir)?;
        tracing::info!(
            dir = %data_dir.display(),
            documents = mem.len(),
            "content store opened"
        );
        Ok(Self {
            mem,
            wal: Mutex::new(wal),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn append(wal: &mut Wal, rec: &WalRecord) -> Result<()> {
    wal.append(rec)
        .map_err(|e| ContentError::Provider(format!("wal append failed: {e}")))
}

/// Rebuilds the in-memory state from a WAL directory.
pub fn load(wal_dir: &Path) -> std::io::Result<InMemoryProvider> {
    let mem = InMemoryProvider::new();
    for rec in Wal::replay(wal_dir)? {
        match rec {
            WalRecord::Put { doc, .. } => mem.replay_put(doc),
            WalRecord::Delete { id } => mem.replay_delete(&id),
        }
    }
    Ok(mem)
}

#[async_trait::async_trait]
impl ContentProvider for PersistentProvider {
    async fn find(&self, query: &CleanedQuery) -> Result<Vec<Document>> {
        self.mem.find(query).await
    }

    async fn find_one(&self, id: &str) -> Result<Document> {
        self.mem.find_one(id).await
    }

    // Writes hold the WAL mutex from planning through apply, so the log and
    // memory see the same order, and a failed append leaves memory untouched.
    async fn save(&self, doc: Document) -> Result<Document> {
        let mut wal = self.wal.lock();
        let (id, saved) = self.mem.plan_save(doc)?;
        append(
            &mut wal,
            &WalRecord::Put {
                id,
                doc: saved.clone(),
            },
        )?;
        self.mem.replay_put(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: &str, doc: Document) -> Result<UpdateOutcome> {
        let mut wal = self.wal.lock();
        let out = self.mem.plan_update(id, doc);
        if out.updated > 0 {
            append(
                &mut wal,
                &WalRecord::Put {
                    id: id.to_string(),
                    doc: out.document.clone(),
                },
            )?;
            self.mem.replay_put(out.document.clone());
        }
        Ok(out)
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let mut wal = self.wal.lock();
        if !self.mem.contains(id) {
            return Ok(0);
        }
        append(&mut wal, &WalRecord::Delete { id: id.to_string() })?;
        self.mem.replay_delete(id);
        Ok(1)
    }

    fn mode(&self) -> &'static str {
        "persistent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentblocks_core::clean;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let p = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
            p.save(doc(json!({"_id": "1", "@subject": "Home"}))).await.unwrap();
            p.save(doc(json!({"_id": "2", "@subject": "About"}))).await.unwrap();
            p.save(doc(json!({"_id": "3", "@subject": "Contact"}))).await.unwrap();
            p.update("2", doc(json!({"@subject": "About us"}))).await.unwrap();
            assert_eq!(p.delete("3").await.unwrap(), 1);
        }
        let p = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(p.mode(), "persistent");
        let all = p.find(&CleanedQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            p.find_one("2").await.unwrap().get("@subject"),
            Some(&json!("About us"))
        );
        let hits = p.find(&clean(r#"{"@subject":"/home/"}"#).unwrap()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(p.find_one("3").await.is_err());
    }

    #[tokio::test]
    async fn noop_writes_are_not_journaled() {
        let dir = tempfile::tempdir().unwrap();
        let p = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(p.delete("missing").await.unwrap(), 0);
        assert_eq!(p.update("missing", doc(json!({"a": 1}))).await.unwrap().updated, 0);
        assert!(Wal::replay(&p.data_dir().join("wal")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_append_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let p = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
        p.save(doc(json!({"_id": "1", "title": "kept"}))).await.unwrap();

        let broken = dir.path().join("broken");
        std::fs::write(&broken, "").unwrap();
        *p.wal.lock() = Wal::read_only(&broken).unwrap();

        let err = p.save(doc(json!({"_id": "2", "title": "lost"}))).await.unwrap_err();
        assert!(matches!(err, ContentError::Provider(_)));
        assert!(p.find_one("2").await.is_err());

        assert!(p.update("1", doc(json!({"title": "changed"}))).await.is_err());
        assert_eq!(p.find_one("1").await.unwrap()["title"], "kept");

        assert!(p.delete("1").await.is_err());
        assert!(p.find_one("1").await.is_ok());

        let live = p.find(&CleanedQuery::default()).await.unwrap();
        drop(p);
        let reopened = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.find(&CleanedQuery::default()).await.unwrap(), live);

        // a retry after the log recovers is not a conflict
        let saved = reopened
            .save(doc(json!({"_id": "2", "title": "lost"})))
            .await
            .unwrap();
        assert_eq!(saved["title"], "lost");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_replay_to_live_state() {
        let dir = tempfile::tempdir().unwrap();
        let p = Arc::new(PersistentProvider::open(dir.path().to_path_buf()).unwrap());
        let mut tasks = Vec::new();
        for worker in 0..4u64 {
            let p = p.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..100u64 {
                    let n = worker * 1000 + i;
                    match i % 3 {
                        0 => {
                            let _ = p.save(doc(json!({"_id": "x", "n": n}))).await;
                        }
                        1 => {
                            p.update("x", doc(json!({"n": n}))).await.unwrap();
                        }
                        _ => {
                            p.delete("x").await.unwrap();
                        }
                    }
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        let live = p.find(&CleanedQuery::default()).await.unwrap();
        drop(p);
        let reopened = PersistentProvider::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.find(&CleanedQuery::default()).await.unwrap(), live);
    }
}
