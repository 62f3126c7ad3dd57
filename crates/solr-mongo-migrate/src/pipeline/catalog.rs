//! The job catalog.
//!
//! Page sizes are fixed per job. Comment cores have small records and use
//! larger pages.

use super::JobSpec;
use crate::error::{MigrateError, Result};
use crate::transform::TransformKind;

/// Page size for post and user cores.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Page size for comment cores.
pub const COMMENT_PAGE_SIZE: usize = 3000;

/// Every job, in run order.
pub fn default_jobs() -> Vec<JobSpec> {
    vec![
        JobSpec::new("d3_posts", "dirty_posts", TransformKind::DirtyPosts, DEFAULT_PAGE_SIZE),
        JobSpec::new("d3_users", "dirty_users", TransformKind::DirtyUsers, DEFAULT_PAGE_SIZE),
        JobSpec::new(
            "d3_comments",
            "dirty_comments",
            TransformKind::DirtyComments,
            COMMENT_PAGE_SIZE,
        ),
        JobSpec::new(
            "ftp_links",
            "ftp_comments",
            TransformKind::FtpComments,
            COMMENT_PAGE_SIZE,
        ),
        JobSpec::new("ftp_posts", "ftp_posts", TransformKind::FtpPosts, DEFAULT_PAGE_SIZE),
    ]
}

/// Keep only the jobs whose target collection is named in `only`.
///
/// Catalog order is preserved regardless of the order of `only`. An empty
/// filter keeps every job. Unknown names are a configuration error.
pub fn select_jobs(jobs: Vec<JobSpec>, only: &[String]) -> Result<Vec<JobSpec>> {
    if only.is_empty() {
        return Ok(jobs);
    }

    let unknown: Vec<&str> = only
        .iter()
        .map(String::as_str)
        .filter(|name| !jobs.iter().any(|j| j.target_collection == *name))
        .collect();
    if !unknown.is_empty() {
        let known: Vec<&str> = jobs.iter().map(|j| j.target_collection.as_str()).collect();
        return Err(MigrateError::Config(format!(
            "Unknown collection(s): {} (known: {})",
            unknown.join(", "),
            known.join(", ")
        )));
    }

    Ok(jobs
        .into_iter()
        .filter(|j| only.iter().any(|name| *name == j.target_collection))
        .collect())
}
