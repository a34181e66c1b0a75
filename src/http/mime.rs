//! MIME type detection module
//!
//! Maps asset file extensions to a Content-Type.

/// Content-Type for shell scripts such as `lib.sh`
pub const SHELL_SCRIPT: &str = "text/x-shellscript; charset=utf-8";

const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type based on file extension (case-insensitive)
///
/// # Examples
/// ```
/// use libdotnew_edge::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("sh")), "text/x-shellscript; charset=utf-8");
/// assert_eq!(get_content_type(Some("TXT")), "text/plain; charset=utf-8");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        // Scripts
        "sh" | "bash" | "zsh" => SHELL_SCRIPT,
        "ps1" => "text/plain; charset=utf-8",

        // Text
        "txt" | "md" | "asc" | "sig" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "json" => "application/json",
        "js" | "mjs" => "application/javascript",

        // Archives and checksums
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "zip" => "application/zip",
        "sha256" => "text/plain; charset=utf-8",

        // Images
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",

        _ => OCTET_STREAM,
    }
}
