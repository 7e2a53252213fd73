//! # Input Validation: Distribution Path
//!
//! The dist path is handed to `twine` as an argument, so it is checked for injection
//! payloads and for ways out of the working directory. Only POSIX separators are
//! understood; backslashes never pass the character check.

use crate::error::ValidationError;
use crate::result::ValidationResult;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum accepted dist path length, in characters
pub const MAX_DIST_PATH_LENGTH: usize = 256;

/// Alphanumerics, dots, dashes, underscores, forward slashes and `*` globs
static DIST_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._/*-]+$")
        .expect("Dist path regex should compile - this is a static character class")
});

/// Lexically normalise a POSIX path.
///
/// Repeated separators and `.` segments disappear, `name/..` pairs cancel out, and
/// leading `..` segments of a relative path are kept. `..` directly under the root is
/// dropped. An empty result becomes `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Validate that a dist path pattern is safe to pass to the upload tool.
///
/// Checks run in order and the first failure wins: emptiness, length, the character
/// allow-list (this is what stops `;`, `|`, backticks, `$(...)` and spaces), traversal
/// in the cleaned path with globs removed, and finally absolute paths.
///
/// # Examples
///
/// ```rust
/// use pypi_validation::paths::validate_dist_path;
///
/// assert!(validate_dist_path("dist/*").is_ok());
/// assert!(validate_dist_path("../../etc/passwd").is_err());
/// assert!(validate_dist_path("/etc/passwd").is_err());
/// assert!(validate_dist_path("dist/*; rm -rf /").is_err());
/// ```
pub fn validate_dist_path(path: &str) -> ValidationResult<()> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    let length = path.chars().count();
    if length > MAX_DIST_PATH_LENGTH {
        return Err(ValidationError::PathTooLong {
            actual: length,
            max: MAX_DIST_PATH_LENGTH,
        });
    }

    if !DIST_PATH_REGEX.is_match(path) {
        return Err(ValidationError::InvalidCharacters {
            input: path.to_string(),
        });
    }

    // Globs are stripped so a `*` segment cannot disguise or mimic a `..`.
    let without_globs = clean_path(path).replace('*', "");
    if without_globs.starts_with("..") || without_globs.contains("/..") {
        return Err(ValidationError::PathTraversal {
            path: path.to_string(),
        });
    }

    if path.starts_with('/') {
        return Err(ValidationError::AbsolutePath {
            path: path.to_string(),
        });
    }

    Ok(())
}
