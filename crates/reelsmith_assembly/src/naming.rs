//! Output file naming.

use regex::Regex;
use std::sync::LazyLock;

/// Name used when the requested name has nothing usable in it.
pub const DEFAULT_OUTPUT_NAME: &str = "final_video";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("Valid output name regex"));

/// Reduces a requested output name to `[A-Za-z0-9._-]`.
///
/// Runs of other characters become a single `-`. Leading dots and dashes are
/// dropped so the result is never hidden or mistaken for a flag.
///
/// # Examples
///
/// ```
/// use reelsmith_assembly::sanitize_output_name;
///
/// assert_eq!(sanitize_output_name("The Vault: Part 2"), "The-Vault-Part-2");
/// assert_eq!(sanitize_output_name("  "), "final_video");
/// assert_eq!(sanitize_output_name("../../etc/passwd"), "etc-passwd");
/// ```
pub fn sanitize_output_name(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name.trim(), "-");
    let cleaned = replaced
        .trim_start_matches(['.', '-'])
        .trim_end_matches('-');
    if cleaned.is_empty() {
        DEFAULT_OUTPUT_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
