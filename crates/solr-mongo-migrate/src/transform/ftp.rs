//! Transforms for the found-the-place cores (geo-tagged posts and links).
//!
//! These cores use PascalCase field names and carry many legacy fields the
//! site no longer reads; only the geo and "found" fields survive.

use super::coerce::{drop_all, is_falsy, parse_date, rename, sparse_numeric};
use super::{begin, Rejected};
use crate::core::{Fields, NormalizedRecord, RawRecord};

const POST_LEGACY_FIELDS: &[&str] = &[
    "Title",
    "Image",
    "Rating",
    "Tags",
    "Content",
    "CommentsCount",
    "CreatedDate",
    "ChangedDate",
    "CreatedById",
];

const COMMENT_LEGACY_FIELDS: &[&str] = &["id", "UserId", "PostId", "Rating", "CreatedDate"];

/// `ftp_posts` → `ftp_posts`.
pub(super) fn posts(raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
    let (id, mut fields) = begin(raw, "id")?;

    drop_all(&mut fields, POST_LEGACY_FIELDS);
    rename(&mut fields, "IsFound", "found");
    move_coordinates(&mut fields);
    move_sparse_numeric(&mut fields, "FoundById", "found_by_id");

    if let Some(found_date) = fields.remove("FoundDate") {
        if !is_falsy(&found_date) {
            fields.insert("found_date".to_string(), parse_date(found_date));
        }
    }

    Ok(NormalizedRecord::new(id, fields))
}

/// `ftp_links` → `ftp_comments`.
pub(super) fn comments(raw: RawRecord) -> Result<NormalizedRecord, Rejected> {
    let (id, mut fields) = begin(raw, "CommentId")?;

    drop_all(&mut fields, COMMENT_LEGACY_FIELDS);
    rename(&mut fields, "IsExtracted", "extracted");
    move_coordinates(&mut fields);

    Ok(NormalizedRecord::new(id, fields))
}

fn move_coordinates(fields: &mut Fields) {
    move_sparse_numeric(fields, "Longitude", "longitude");
    move_sparse_numeric(fields, "Latitude", "latitude");
}

fn move_sparse_numeric(fields: &mut Fields, from: &str, to: &str) {
    match sparse_numeric(fields.remove(from)) {
        Some(value) => {
            fields.insert(to.to_string(), value);
        }
        None => {
            fields.remove(to);
        }
    }
}
