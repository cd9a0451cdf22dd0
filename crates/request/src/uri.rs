//! Request target sanitation.

use std::borrow::Cow;

use http::Uri;

use crate::RequestError;

/// Collapses every run of two or more `/` into a single `/`.
///
/// This is a lossy, best-effort pass that runs over the whole raw target, so it also rewrites
/// `//` in a query string or after an absolute-form scheme.
pub fn collapse_slashes(raw: &str) -> Cow<'_, str> {
    if !raw.contains("//") {
        return Cow::Borrowed(raw);
    }

    let mut collapsed = String::with_capacity(raw.len());
    let mut after_slash = false;
    for ch in raw.chars() {
        if ch == '/' {
            if after_slash {
                continue;
            }
            after_slash = true;
        } else {
            after_slash = false;
        }
        collapsed.push(ch);
    }
    Cow::Owned(collapsed)
}

/// Sanitizes a raw request target and parses it.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUri`] when the target is still rejected after sanitation.
pub fn parse_uri(raw: &str) -> Result<Uri, RequestError> {
    Ok(collapse_slashes(raw).parse::<Uri>()?)
}
