use std::borrow::Cow;

use regex::{NoExpand, Regex};

/// Returns a lowercase representation, reusing the original string if already lowercase.
pub fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Trims leading/trailing whitespace while borrowing the original.
pub fn trim(input: &str) -> Cow<'_, str> {
    Cow::Borrowed(input.trim())
}

/// Replaces every match, borrowing the input when nothing matched.
///
/// With `expand` set, `$1` and `${name}` in `replacement` refer to capture
/// groups; otherwise the replacement is inserted verbatim.
pub fn regex_replace<'a>(
    value: &'a str,
    regex: &Regex,
    replacement: &str,
    expand: bool,
) -> Cow<'a, str> {
    if !regex.is_match(value) {
        return Cow::Borrowed(value);
    }
    if expand {
        Cow::Owned(regex.replace_all(value, replacement).into_owned())
    } else {
        Cow::Owned(regex.replace_all(value, NoExpand(replacement)).into_owned())
    }
}
