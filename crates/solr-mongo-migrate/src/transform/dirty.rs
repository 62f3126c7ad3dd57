//! Transforms for the `d3_*` cores (posts, users, comments).

use super::coerce::{is_falsy, numeric_or_original, parse_dates, rename};
use super::{begin, Rejected};
use crate::core::{NormalizedRecord, RawRecord};

/// `d3_posts` → `dirty_posts`.
pub(super) fn posts(raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
    let (id, mut fields) = begin(raw, "id")?;

    if let Some(user_id) = fields.remove("user_id") {
        let user_id = if user_id.is_null() {
            user_id
        } else {
            numeric_or_original(user_id)
        };
        fields.insert("user_id".to_string(), user_id);
    }

    parse_dates(&mut fields, &["created", "changed"]);

    Ok(NormalizedRecord::new(id, fields))
}

/// `d3_users` → `dirty_users`.
pub(super) fn users(raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
    let (id, fields) = begin(raw, "id")?;
    Ok(NormalizedRecord::new(id, fields))
}

/// `d3_comments` → `dirty_comments`.
pub(super) fn comments(raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
    let (id, mut fields) = begin(raw, "id")?;

    // Top-level comments carry no parent at all.
    if let Some(parent) = fields.remove("parent_id") {
        if !is_falsy(&parent) {
            fields.insert("parent_id".to_string(), numeric_or_original(parent));
        }
    }

    rename(&mut fields, "body", "text");

    for name in ["post_id", "user_id"] {
        if let Some(value) = fields.remove(name) {
            fields.insert(name.to_string(), numeric_or_original(value));
        }
    }

    parse_dates(&mut fields, &["created"]);

    Ok(NormalizedRecord::new(id, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::transform::raw;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_posts_scenario() {
        let record = posts(raw(json!({
            "id": "42",
            "version": "7",
            "created": "2021-05-01T00:00:00Z",
            "user_id": "9"
        })))
        .unwrap();

        assert_eq!(record.id(), &FieldValue::Int(42));
        assert_eq!(record.get("user_id"), Some(&FieldValue::Int(9)));
        assert_eq!(
            record.get("created"),
            Some(&FieldValue::DateTime(Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap()))
        );
        assert!(!record.contains("version"));
        assert!(!record.contains("id"));
        assert_eq!(record.fields().len(), 2);
    }

    #[test]
    fn test_posts_fallbacks() {
        let record = posts(raw(json!({
            "id": "slug-7",
            "user_id": "anonymous",
            "changed": "not a date",
            "title": "Lost cat"
        })))
        .unwrap();

        assert_eq!(record.id(), &FieldValue::from("slug-7"));
        assert_eq!(record.get("user_id"), Some(&FieldValue::from("anonymous")));
        assert_eq!(record.get("changed"), Some(&FieldValue::from("not a date")));
        assert_eq!(record.get("title"), Some(&FieldValue::from("Lost cat")));
    }

    #[test]
    fn test_posts_null_user_untouched() {
        let record = posts(raw(json!({"id": 1, "user_id": null}))).unwrap();
        assert_eq!(record.get("user_id"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_users_only_rekeys() {
        let record = users(raw(json!({
            "id": "314",
            "_version_": 99,
            "name": "ada",
            "karma": "12"
        })))
        .unwrap();

        assert_eq!(record.id(), &FieldValue::Int(314));
        assert_eq!(record.get("name"), Some(&FieldValue::from("ada")));
        // Users have no numeric fields of their own; karma stays as the source sent it.
        assert_eq!(record.get("karma"), Some(&FieldValue::from("12")));
    }

    #[test]
    fn test_comments_full_mapping() {
        let record = comments(raw(json!({
            "id": "1001",
            "version": 2,
            "parent_id": "1000",
            "body": "me too",
            "post_id": "42",
            "user_id": "9",
            "created": "2022-01-02T03:04:05Z"
        })))
        .unwrap();

        assert_eq!(record.id(), &FieldValue::Int(1001));
        assert_eq!(record.get("parent_id"), Some(&FieldValue::Int(1000)));
        assert_eq!(record.get("text"), Some(&FieldValue::from("me too")));
        assert!(!record.contains("body"));
        assert_eq!(record.get("post_id"), Some(&FieldValue::Int(42)));
        assert_eq!(record.get("user_id"), Some(&FieldValue::Int(9)));
        assert!(matches!(record.get("created"), Some(FieldValue::DateTime(_))));
    }

    #[test]
    fn test_comments_empty_parent_dropped() {
        for parent in [json!(""), json!(null), json!(0)] {
            let record = comments(raw(json!({"id": "5", "parent_id": parent}))).unwrap();
            assert!(!record.contains("parent_id"));
        }
    }

    #[test]
    fn test_comments_without_body_have_no_text() {
        let record = comments(raw(json!({"id": "5"}))).unwrap();
        assert!(!record.contains("text"));
        assert!(!record.contains("post_id"));
    }

    #[test]
    fn test_comments_dirty_foreign_keys_survive() {
        let record = comments(raw(json!({"id": "5", "post_id": "deleted", "parent_id": "root"}))).unwrap();
        assert_eq!(record.get("post_id"), Some(&FieldValue::from("deleted")));
        assert_eq!(record.get("parent_id"), Some(&FieldValue::from("root")));
    }
}
