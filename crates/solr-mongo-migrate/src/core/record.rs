//! Raw and normalized record types.

use std::collections::BTreeMap;

use mongodb::bson::Document;

use super::value::FieldValue;

/// Canonical primary-key field in the document store.
pub const PRIMARY_KEY_FIELD: &str = "_id";

/// A record exactly as returned by the search service.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Working field set used while transforming a record.
pub type Fields = BTreeMap<String, FieldValue>;

/// A record after transformation.
///
/// Always carries exactly one primary key. The key lives outside the field
/// map so no field can shadow it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    id: FieldValue,
    fields: Fields,
}

impl NormalizedRecord {
    /// Create a record. Any `_id` left in `fields` is discarded.
    pub fn new(id: FieldValue, mut fields: Fields) -> Self {
        fields.remove(PRIMARY_KEY_FIELD);
        Self { id, fields }
    }

    /// Primary key value.
    pub fn id(&self) -> &FieldValue {
        &self.id
    }

    /// Look up a non-key field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether a non-key field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Non-key fields in key order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// BSON filter selecting this record by primary key.
    pub fn id_filter(&self) -> Document {
        let mut filter = Document::new();
        filter.insert(PRIMARY_KEY_FIELD, self.id.to_bson());
        filter
    }

    /// Full replacement document, `_id` first.
    pub fn to_document(&self) -> Document {
        let mut doc = self.id_filter();
        for (name, value) in &self.fields {
            doc.insert(name.clone(), value.to_bson());
        }
        doc
    }
}
