//! Minimal flat-name reference resolution.
//!
//! Resolves `HEAD` and direct `refs/heads/<name>` / `refs/tags/<name>` files to
//! an object id. Packed-refs, reflogs, and general namespace walking are out
//! of scope here; a richer ref store can be plugged in via [`RefResolver`].

use std::fs;
use std::path::PathBuf;

use git_hash::ObjectId;

use crate::RepoError;

/// Maximum levels of `ref: <target>` indirection to follow before giving up.
const MAX_SYMBOLIC_DEPTH: usize = 5;

/// Seam for reference resolution, so the repository doesn't need to depend
/// on a full ref-store implementation to resolve `HEAD`.
pub trait RefResolver: Send + Sync {
    /// Resolve a ref name (e.g. `"HEAD"`, `"refs/heads/main"`) to an object id.
    ///
    /// Returns `Ok(None)` if the name doesn't resolve to anything (unborn
    /// branch, or the ref simply doesn't exist).
    fn resolve(&self, name: &str) -> Result<Option<ObjectId>, RepoError>;

    /// The branch name `HEAD` points to, or `None` on detached/unborn HEAD.
    fn head_branch(&self) -> Result<Option<String>, RepoError>;
}

/// Resolves refs by reading loose ref files directly out of the common dir.
pub struct FlatRefResolver {
    common_dir: PathBuf,
}

impl FlatRefResolver {
    pub fn new(common_dir: impl Into<PathBuf>) -> Self {
        Self {
            common_dir: common_dir.into(),
        }
    }

    fn read_ref_file(&self, relative: &str) -> Result<Option<String>, RepoError> {
        match fs::read_to_string(self.common_dir.join(relative)) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::Io(e)),
        }
    }
}

impl RefResolver for FlatRefResolver {
    fn resolve(&self, name: &str) -> Result<Option<ObjectId>, RepoError> {
        let mut current = name.to_string();
        for _ in 0..MAX_SYMBOLIC_DEPTH {
            let content = match self.read_ref_file(&current)? {
                Some(c) => c,
                None => return Ok(None),
            };
            if let Some(target) = content.strip_prefix("ref: ") {
                current = target.trim().to_string();
                continue;
            }
            let oid = ObjectId::from_hex(content.trim()).map_err(|_| {
                RepoError::InvalidHead(format!("malformed ref content in {current}: {content}"))
            })?;
            return Ok(Some(oid));
        }
        Err(RepoError::InvalidHead(format!(
            "too many levels of symbolic indirection resolving {name}"
        )))
    }

    fn head_branch(&self) -> Result<Option<String>, RepoError> {
        match self.read_ref_file("HEAD")? {
            Some(content) => match content.strip_prefix("ref: ") {
                Some(target) => Ok(target.trim().strip_prefix("refs/heads/").map(String::from)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }
}
