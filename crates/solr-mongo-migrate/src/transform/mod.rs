//! Per-collection document transformers.
//!
//! Each source core has its own field-mapping rules. The rules share nothing
//! but their signature, so they are plain functions picked from a dispatch
//! table by [`TransformKind`].
//!
//! Transformers are pure: no I/O and no state between calls.

pub mod coerce;
mod dirty;
mod ftp;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Fields, FieldValue, NormalizedRecord, RawRecord};
use crate::error::MigrateError;

/// Bookkeeping fields the search index adds to every record.
const BOOKKEEPING_FIELDS: &[&str] = &["version", "_version_"];

/// A record that cannot be stored because it has no primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    /// Name of the missing primary-key field.
    pub field: &'static str,
}

impl From<Rejected> for MigrateError {
    fn from(r: Rejected) -> Self {
        MigrateError::MalformedRecord {
            field: r.field.to_string(),
        }
    }
}

/// Signature shared by all transform variants.
pub type TransformFn = fn(RawRecord) -> Result<NormalizedRecord, Rejected>;

/// The transform variants, one per source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    DirtyPosts,
    DirtyUsers,
    DirtyComments,
    FtpPosts,
    FtpComments,
}

impl TransformKind {
    /// Every variant, in catalog order.
    pub const ALL: [TransformKind; 5] = [
        TransformKind::DirtyPosts,
        TransformKind::DirtyUsers,
        TransformKind::DirtyComments,
        TransformKind::FtpComments,
        TransformKind::FtpPosts,
    ];

    /// The transform function for this variant.
    pub fn function(self) -> TransformFn {
        match self {
            TransformKind::DirtyPosts => dirty::posts,
            TransformKind::DirtyUsers => dirty::users,
            TransformKind::DirtyComments => dirty::comments,
            TransformKind::FtpPosts => ftp::posts,
            TransformKind::FtpComments => ftp::comments,
        }
    }

    /// Target collection name this variant is written for.
    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::DirtyPosts => "dirty_posts",
            TransformKind::DirtyUsers => "dirty_users",
            TransformKind::DirtyComments => "dirty_comments",
            TransformKind::FtpPosts => "ftp_posts",
            TransformKind::FtpComments => "ftp_comments",
        }
    }

    /// Look up a variant by target collection name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Apply this variant to a raw record.
    pub fn apply(self, raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
        (self.function())(raw)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared first steps: lift the raw record, extract the primary key from
/// `id_field`, and drop bookkeeping fields.
fn begin(raw: RawRecord, id_field: &'static str) -> Result<(FieldValue, Fields), Rejected> {
    let mut fields: Fields = raw
        .into_iter()
        .map(|(k, v)| (k, FieldValue::from(v)))
        .collect();

    let id = fields
        .remove(id_field)
        .filter(|v| !is_blank(v))
        .ok_or(Rejected { field: id_field })?;

    coerce::drop_all(&mut fields, BOOKKEEPING_FIELDS);

    Ok((coerce::numeric_or_original(id), fields))
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Text(s) => s.trim().is_empty(),
        FieldValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
pub(crate) fn raw(value: serde_json::Value) -> RawRecord {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatch_table_round_trips_names() {
        for kind in TransformKind::ALL {
            assert_eq!(TransformKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(TransformKind::from_name("dirty_votes"), None);
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        for kind in TransformKind::ALL {
            let result = kind.apply(raw(json!({"title": "orphan"})));
            assert!(result.is_err(), "{kind} accepted a record with no id");
        }
    }

    #[test]
    fn test_blank_primary_key_rejected() {
        let result = TransformKind::DirtyUsers.apply(raw(json!({"id": "  "})));
        assert_eq!(result, Err(Rejected { field: "id" }));

        let result = TransformKind::DirtyUsers.apply(raw(json!({"id": null})));
        assert_eq!(result, Err(Rejected { field: "id" }));
    }

    #[test]
    fn test_bookkeeping_dropped_by_every_variant() {
        for kind in TransformKind::ALL {
            let record = kind
                .apply(raw(json!({
                    "id": "5",
                    "CommentId": "5",
                    "version": "3",
                    "_version_": 1712345678901234567_i64
                })))
                .unwrap();
            assert!(!record.contains("version"), "{kind} kept version");
            assert!(!record.contains("_version_"), "{kind} kept _version_");
            assert!(!record.contains("id"), "{kind} kept id");
            assert_eq!(record.id(), &FieldValue::Int(5));
        }
    }

    #[test]
    fn test_rejected_maps_to_malformed_record() {
        let err: MigrateError = Rejected { field: "CommentId" }.into();
        assert!(matches!(err, MigrateError::MalformedRecord { ref field } if field == "CommentId"));
    }
}
