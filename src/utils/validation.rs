//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::AutoAddTag;
use crate::utils::error::{ComError, ComResult};

/// Regex for validating auto-add tags (`<name>=<value>`)
///
/// Both sides accept letters, digits, unicode spaces and `_.:+-@`. The `=`
/// separator is excluded from both character classes, so a second `=` can
/// never match.
static AUTO_ADD_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{Nd}\p{Zs}_.:+@-]+=[\p{L}\p{Nd}\p{Zs}_.:+@-]+$").unwrap()
});

/// Regex for validating group names
static GROUP_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9 _-]*$").unwrap()
});

/// Regex for validating region identifiers (e.g. `us-west`, `eu-central`)
static REGION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*$").unwrap()
});

/// Parse a raw auto-add tag string into its name/value pair.
///
/// Fails with [`ComError::InvalidTagFormat`] before any request is built, per
/// the tag grammar above.
pub fn parse_auto_add_tag(raw: &str) -> ComResult<AutoAddTag> {
    if !AUTO_ADD_TAG_REGEX.is_match(raw) {
        return Err(ComError::InvalidTagFormat(raw.to_string()));
    }

    // The grammar guarantees exactly one separator
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| ComError::InvalidTagFormat(raw.to_string()))?;

    Ok(AutoAddTag {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Validate a group name.
///
/// Names must start with a letter or digit, stay within 100 characters and
/// use only letters, digits, spaces, `_` or `-`.
pub fn validate_group_name(name: &str) -> ComResult<()> {
    if name.is_empty() || name.len() > 100 || !GROUP_NAME_REGEX.is_match(name) {
        return Err(ComError::validation(format!(
            "invalid group name '{}': must start with a letter or digit and use only letters, digits, spaces, '_' or '-' (max 100 characters)",
            name
        )));
    }
    Ok(())
}

/// Validate a region identifier
pub fn validate_region(region: &str) -> ComResult<()> {
    if region.is_empty() || region.len() > 32 || !REGION_REGEX.is_match(region) {
        return Err(ComError::validation(format!(
            "invalid region '{}': expected a lowercase identifier like 'us-west'",
            region
        )));
    }
    Ok(())
}

/// Validate a webhook destination. The API only delivers to absolute
/// https URLs.
pub fn validate_webhook_destination(destination: &str) -> ComResult<()> {
    let rest = destination.strip_prefix("https://").unwrap_or("");
    if rest.is_empty() {
        return Err(ComError::validation(format!(
            "invalid webhook destination '{}': an absolute https:// URL is required",
            destination
        )));
    }
    Ok(())
}
