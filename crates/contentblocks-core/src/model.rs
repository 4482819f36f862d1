use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content block as stored by a provider.
pub type Document = Map<String, Value>;
pub type ItemId = String;

/// Field holding a content block's identifier.
pub const ID_FIELD: &str = "_id";

pub fn document_id(doc: &Document) -> Option<ItemId> {
    match doc.get(ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub document: Value,
    pub updated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: ItemId,
    pub deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_from_string_or_number() {
        let doc = json!({"_id": "42"}).as_object().cloned().unwrap();
        assert_eq!(document_id(&doc).as_deref(), Some("42"));
        let doc = json!({"_id": 7}).as_object().cloned().unwrap();
        assert_eq!(document_id(&doc).as_deref(), Some("7"));
        let doc = json!({"_id": [1]}).as_object().cloned().unwrap();
        assert_eq!(document_id(&doc), None);
    }

    #[test]
    fn response_shapes() {
        let del = DeleteResponse {
            id: "42".into(),
            deleted: 1,
        };
        assert_eq!(serde_json::to_value(del).unwrap(), json!({"id": "42", "deleted": 1}));
        let err = ErrorBody::new("No records found.");
        assert_eq!(
            serde_json::to_value(err).unwrap(),
            json!({"error": "No records found."})
        );
    }
}
