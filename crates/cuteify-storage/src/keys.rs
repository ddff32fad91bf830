//! File naming for transient uploads and generated variants.
//!
//! Transient names only need to be unique across concurrent requests, so they
//! come from a random token rather than any shared counter. Variant names are a
//! pure function of the transient name and the variant suffix.

use std::path::Path;

use cuteify_core::constants::OUTPUT_EXTENSION;
use uuid::Uuid;

/// Extension of the client-supplied filename, without the dot, as given.
pub fn original_extension(original_filename: &str) -> Option<&str> {
    Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Generate a collision-resistant name for a transient upload: `{token}{.ext}`.
pub fn transient_file_name(original_filename: &str) -> String {
    let token = Uuid::new_v4().simple();
    match original_extension(original_filename) {
        Some(ext) => format!("{}.{}", token, ext),
        None => token.to_string(),
    }
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Name of the variant derived from `input_file_name`: `{stem}{suffix}.jpg`.
pub fn output_file_name(input_file_name: &str, suffix: &str) -> String {
    format!("{}{}.{OUTPUT_EXTENSION}", file_stem(input_file_name), suffix)
}

/// Public path of a file under a static route, e.g. `/processed/{name}`.
pub fn public_path(route_prefix: &str, file_name: &str) -> String {
    format!("{}/{}", route_prefix.trim_end_matches('/'), file_name)
}

/// Names must stay inside their directory.
pub fn is_safe_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.contains("..")
        && !file_name.contains('/')
        && !file_name.contains('\\')
}
