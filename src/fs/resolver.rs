//! Maps a request path to a filesystem resource.
//!
//! Resolution order: decode percent-escapes, stat the candidate, check the
//! other-readable bit, classify as directory or regular file. Regular files
//! are opened read-only and memory-mapped for zero-copy transmission; the
//! descriptor is dropped right after mapping, the mapping itself is the
//! owned resource.

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::os::unix::ffi::OsStringExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::http::{mime, percent};

/// A read-only memory mapping of a regular file.
///
/// The mapping is released when the handle drops, on every exit path of the
/// response transmission: completed send, write error or connection
/// teardown.
#[derive(Debug)]
pub struct MappedFile {
    map: Mmap,
}

impl MappedFile {
    /// Opens `path` read-only and maps it whole.
    ///
    /// The file must be non-empty; a zero-length mapping is rejected by the
    /// kernel, and empty files get a generated body instead.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // The mapping outlives the descriptor; it is torn down on drop.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }
}

/// Classification of a resolved request path.
#[derive(Debug)]
pub enum Resolved {
    /// No such file: answer 404.
    Missing,
    /// Exists but is not other-readable: answer 403.
    Forbidden,
    /// A directory: answer with a generated listing.
    Directory(PathBuf),
    /// A non-empty regular file, mapped and ready to transmit.
    File {
        map: MappedFile,
        content_type: &'static str,
    },
    /// A zero-length regular file: answer with the canned empty page.
    EmptyFile,
    /// The resource vanished or could not be mapped after a successful stat.
    Failed,
}

impl Resolved {
    fn from_candidate(candidate: PathBuf) -> Resolved {
        let Ok(meta) = std::fs::metadata(&candidate) else {
            return Resolved::Missing;
        };
        // Mirrors the classic S_IROTH check: world-readable or nothing.
        if meta.permissions().mode() & 0o004 == 0 {
            return Resolved::Forbidden;
        }
        if meta.is_dir() {
            return Resolved::Directory(candidate);
        }
        if meta.len() == 0 {
            return Resolved::EmptyFile;
        }
        match MappedFile::open(&candidate) {
            Ok(map) => Resolved::File {
                map,
                content_type: mime::content_type(&candidate),
            },
            Err(e) => {
                debug!("mapping {} failed: {e}", candidate.display());
                Resolved::Failed
            }
        }
    }
}

/// Resolves a raw (still percent-encoded) request path against the document
/// root. The parser guarantees the path starts with `/`; the root path maps
/// to the document root directory itself.
pub fn resolve(root: &Path, raw_path: &str) -> Resolved {
    let mut bytes = raw_path.as_bytes().to_vec();
    percent::decode(&mut bytes);

    let candidate = if bytes == b"/" {
        root.to_path_buf()
    } else {
        let rel = OsString::from_vec(bytes[1..].to_vec());
        root.join(rel)
    };
    Resolved::from_candidate(candidate)
}
