//! Generated HTML directory listings.

use std::fmt::Write as _;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use bytes::Bytes;

use crate::http::percent;

/// Renders the listing page for `dir`: one table row per entry, sorted
/// alphabetically, linking to a percent-encoded href. Subdirectories get a
/// trailing-slash variant of both the link and the shown name.
pub fn render(dir: &Path) -> io::Result<Bytes> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        // Symlinks are listed with the size of their target, like stat(2).
        let Ok(meta) = std::fs::metadata(entry.path()) else {
            continue;
        };
        entries.push((entry.file_name(), meta));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let shown = dir.display();
    let mut html = String::with_capacity(4096);
    let _ = write!(html, "<html><head><title>Index of {shown}</title></head>");
    let _ = write!(html, "<body><h1>Index of {shown}</h1><table>");

    for (name, meta) in &entries {
        let href = percent::encode(name.as_bytes());
        let raw = name.to_string_lossy();
        let size = meta.len();
        if meta.is_dir() {
            let _ = write!(
                html,
                "<tr><td><a href=\"{href}/\">{raw}/</a></td><td>{size}</td></tr>"
            );
        } else if meta.is_file() {
            let _ = write!(
                html,
                "<tr><td><a href=\"{href}\">{raw}</a></td><td>{size}</td></tr>"
            );
        }
    }

    html.push_str("</table></body></html>");
    Ok(Bytes::from(html))
}
