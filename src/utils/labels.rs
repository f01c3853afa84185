//! Category label loading utilities.
//!
//! The published Places365 category table lists one category per line as a
//! grouped token followed by its numeric id:
//!
//! ```text
//! /a/abbey 0
//! /a/airfield 1
//! /a/apartment_building/outdoor 8
//! ```
//!
//! The leading single-letter group directory carries no meaning for display,
//! so it is stripped and the remainder kept verbatim.

use crate::core::errors::{ClassifierError, ClassifierResult};
use std::path::Path;

/// Reads a category label table and returns labels indexed by category id.
///
/// # Arguments
///
/// * `path` - Path to the label file.
///
/// # Returns
///
/// A vector where position `i` holds the label of category `i`.
///
/// # Errors
///
/// Returns [`ClassifierError::InvalidInput`] if the file cannot be read or
/// the parsed ids are not contiguous.
pub fn read_category_labels(path: &Path) -> ClassifierResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::InvalidInput {
        message: format!(
            "failed to read category labels from '{}': {}",
            path.display(),
            e
        ),
    })?;
    parse_category_labels(&content)
}

/// Parses category label content into labels indexed by category id.
///
/// Blank lines and lines without a label token and a numeric id are
/// skipped. The ids of the remaining lines must cover `0..n` without gaps
/// or duplicates so positional lookups stay valid.
///
/// # Errors
///
/// Returns [`ClassifierError::InvalidInput`] for non-contiguous ids.
pub fn parse_category_labels(content: &str) -> ClassifierResult<Vec<String>> {
    let mut entries: Vec<(usize, String)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let token = fields.next();
        let id = fields.next().and_then(|field| field.parse::<usize>().ok());
        // Incomplete lines and non-numeric ids are skipped, not rejected.
        let (Some(token), Some(id)) = (token, id) else {
            continue;
        };

        entries.push((id, strip_group_prefix(token).to_string()));
    }

    entries.sort_by_key(|(id, _)| *id);
    for (position, (id, _)) in entries.iter().enumerate() {
        if *id != position {
            return Err(ClassifierError::invalid_input(format!(
                "category ids must cover 0..{} without gaps, problem at id {}",
                entries.len(),
                id
            )));
        }
    }

    Ok(entries.into_iter().map(|(_, label)| label).collect())
}

/// Strips the single-letter group directory from a category token.
///
/// `/a/abbey` becomes `abbey` and `/a/apartment_building/outdoor` becomes
/// `apartment_building/outdoor`. Tokens without a group prefix pass through.
fn strip_group_prefix(token: &str) -> &str {
    token
        .strip_prefix('/')
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, label)| label)
        .unwrap_or(token)
}
