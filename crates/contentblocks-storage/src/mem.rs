use crate::traits::{ContentProvider, UpdateOutcome};
use contentblocks_core::util::lookup;
use contentblocks_core::{
    document_id, CleanedQuery, Condition, ContentError, Document, Result, ID_FIELD,
};
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryProvider {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // id -> record; seq keeps results in insertion order
    docs: HashMap<String, Record>,
    next_seq: u64,
}

struct Record {
    seq: u64,
    doc: Document,
}

impl Inner {
    fn upsert(&mut self, id: String, doc: Document) {
        match self.docs.get_mut(&id) {
            Some(rec) => rec.doc = doc,
            None => {
                self.next_seq += 1;
                let seq = self.next_seq;
                self.docs.insert(id, Record { seq, doc });
            }
        }
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay_put(&self, doc: Document) {
        if let Some(id) = document_id(&doc) {
            self.inner.write().upsert(id, doc);
        }
    }

    pub fn replay_delete(&self, id: &str) {
        self.inner.write().docs.remove(id);
    }

    pub fn all_documents(&self) -> Vec<Document> {
        let inner = self.inner.read();
        let mut recs: Vec<&Record> = inner.docs.values().collect();
        recs.sort_by_key(|r| r.seq);
        recs.into_iter().map(|r| r.doc.clone()).collect()
    }

    /// What `save` would store, without storing it.
    pub(crate) fn plan_save(&self, doc: Document) -> Result<(String, Document)> {
        let (id, doc) = assign_id(doc)?;
        if self.inner.read().docs.contains_key(&id) {
            return Err(duplicate(&id));
        }
        Ok((id, doc))
    }

    /// What `update` would return, without applying it.
    pub(crate) fn plan_update(&self, id: &str, doc: Document) -> UpdateOutcome {
        match self.inner.read().docs.get(id) {
            Some(rec) => {
                let mut merged = rec.doc.clone();
                merge(&mut merged, doc);
                UpdateOutcome {
                    document: merged,
                    updated: 1,
                }
            }
            None => UpdateOutcome {
                document: doc,
                updated: 0,
            },
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().docs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ContentProvider for InMemoryProvider {
    async fn find(&self, query: &CleanedQuery) -> Result<Vec<Document>> {
        let compiled = CompiledQuery::compile(query)?;
        let inner = self.inner.read();
        let mut hits: Vec<&Record> = inner
            .docs
            .values()
            .filter(|r| compiled.matches(&r.doc))
            .collect();
        hits.sort_by_key(|r| r.seq);
        Ok(hits.into_iter().map(|r| r.doc.clone()).collect())
    }

    async fn find_one(&self, id: &str) -> Result<Document> {
        self.inner
            .read()
            .docs
            .get(id)
            .map(|r| r.doc.clone())
            .ok_or_else(|| ContentError::RecordNotFound(id.to_string()))
    }

    async fn save(&self, doc: Document) -> Result<Document> {
        let (id, doc) = assign_id(doc)?;
        let mut inner = self.inner.write();
        if inner.docs.contains_key(&id) {
            return Err(duplicate(&id));
        }
        inner.upsert(id, doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: &str, doc: Document) -> Result<UpdateOutcome> {
        let mut inner = self.inner.write();
        let Some(rec) = inner.docs.get_mut(id) else {
            return Ok(UpdateOutcome {
                document: doc,
                updated: 0,
            });
        };
        merge(&mut rec.doc, doc);
        Ok(UpdateOutcome {
            document: rec.doc.clone(),
            updated: 1,
        })
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        Ok(self.inner.write().docs.remove(id).map_or(0, |_| 1))
    }
}

fn assign_id(mut doc: Document) -> Result<(String, Document)> {
    let id = match doc.get(ID_FIELD) {
        None => ulid::Ulid::new().to_string(),
        Some(_) => document_id(&doc).ok_or_else(|| {
            ContentError::Invalid(format!("{ID_FIELD} must be a string or number"))
        })?,
    };
    doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    Ok((id, doc))
}

fn duplicate(id: &str) -> ContentError {
    ContentError::Conflict(format!("duplicate {ID_FIELD} {id}"))
}

// top-level fields only; `_id` is never overwritten
fn merge(target: &mut Document, patch: Document) {
    for (k, v) in patch {
        if k != ID_FIELD {
            target.insert(k, v);
        }
    }
}

enum Matcher {
    Equals(Value),
    Regex(Regex),
}

struct CompiledQuery(Vec<(String, Matcher)>);

impl CompiledQuery {
    fn compile(query: &CleanedQuery) -> Result<Self> {
        let mut out = Vec::with_capacity(query.fields.len());
        for (field, cond) in &query.fields {
            let m = match cond {
                Condition::Equals(v) => Matcher::Equals(v.clone()),
                Condition::Regex(r) => {
                    let re = RegexBuilder::new(&r.pattern)
                        .case_insensitive(r.case_insensitive)
                        .build()
                        .map_err(|e| {
                            ContentError::Provider(format!("invalid regex /{}/: {}", r.pattern, e))
                        })?;
                    Matcher::Regex(re)
                }
            };
            out.push((field.clone(), m));
        }
        Ok(Self(out))
    }

    fn matches(&self, doc: &Document) -> bool {
        self.0.iter().all(|(field, m)| {
            let actual = lookup(doc, field);
            match m {
                Matcher::Equals(expected) => match actual {
                    None => expected.is_null(),
                    Some(Value::Array(items)) if !expected.is_array() => {
                        items.contains(expected)
                    }
                    Some(v) => v == expected,
                },
                Matcher::Regex(re) => match actual {
                    Some(Value::String(s)) => re.is_match(s),
                    Some(Value::Array(items)) => items
                        .iter()
                        .any(|i| i.as_str().is_some_and(|s| re.is_match(s))),
                    _ => false,
                },
            }
        })
    }
}
