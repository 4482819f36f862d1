use serde_json::{Map, Value};

/// Converts a dotted field path (`meta.author`, optionally `$.`-prefixed) to
/// a JSON pointer.
pub fn json_pointer_from_path(path: &str) -> String {
    let p = path.trim();
    let p = p.trim_start_matches('$').trim_start_matches('.');
    let mut out = String::new();
    for part in p.split('.').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(&part.replace('~', "~0").replace('/', "~1"));
    }
    out
}

/// Looks up a field by name, falling back to a dotted path into nested
/// objects when no top-level key matches.
pub fn lookup<'a>(doc: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    if let Some(v) = doc.get(field) {
        return Some(v);
    }
    let (head, rest) = field.split_once('.')?;
    doc.get(head)?.pointer(&json_pointer_from_path(rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pointer_from_dotted_path() {
        assert_eq!(json_pointer_from_path("$.a.b"), "/a/b");
        assert_eq!(json_pointer_from_path("meta.author"), "/meta/author");
        assert_eq!(json_pointer_from_path("a/b"), "/a~1b");
        assert_eq!(json_pointer_from_path(""), "");
    }

    #[test]
    fn lookup_prefers_literal_key() {
        let v = json!({"a.b": 1, "a": {"b": 2}, "@subject": "x"});
        let doc = v.as_object().unwrap();
        assert_eq!(lookup(doc, "a.b"), Some(&json!(1)));
        assert_eq!(lookup(doc, "@subject"), Some(&json!("x")));
        let v = json!({"a": {"b": {"c": 3}}});
        let doc = v.as_object().unwrap();
        assert_eq!(lookup(doc, "a.b.c"), Some(&json!(3)));
        assert_eq!(lookup(doc, "a.x"), None);
        assert_eq!(lookup(doc, "missing"), None);
    }
}
