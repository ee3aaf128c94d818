//! Content-Type detection based on file extensions.

use std::path::Path;

/// Content type of generated pages (listings, canned error bodies).
pub const HTML: &str = "text/html";

/// Fallback for unknown or missing extensions.
pub const DEFAULT: &str = "text/plain; charset=utf-8";

/// Maps a file's extension to its Content-Type, case-insensitively.
pub fn content_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT;
    };
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "png" => "image/png",
        "css" => "text/css",
        "au" => "audio/basic",
        "wav" => "audio/wav",
        "avi" => "video/x-msvideo",
        "mov" | "qt" => "video/quicktime",
        "mpeg" | "mpe" => "video/mpeg",
        "vrml" | "wrl" => "model/vrml",
        "midi" | "mid" => "audio/midi",
        "mp3" => "audio/mpeg",
        "ogg" => "application/ogg",
        "pac" => "application/x-ns-proxy-autoconfig",
        _ => DEFAULT,
    }
}
