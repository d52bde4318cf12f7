//! Resolution of typed-object edges.
//!
//! `Commit`, `Tag`, and `Tree` only store the digests of the objects they
//! point to. Following an edge — a tag's target, a commit's tree or parent,
//! a tree entry's child — requires both the cache and the object database,
//! so these operations live here on [`Repository`] rather than on the bare
//! parsed structs.

use std::sync::Arc;

use git_hash::ObjectId;
use git_object::{Commit, FileMode, Object, ObjectType, Tag, TreeEntry};

use crate::{RepoError, Repository};

impl Repository {
    /// Look up an object by id, going through the object database's cache.
    pub fn find_object(&self, oid: &ObjectId) -> Result<Arc<Object>, RepoError> {
        self.odb
            .read_cached(oid)?
            .ok_or(RepoError::Odb(git_odb::OdbError::NotFound(*oid)))
    }

    /// Look up an object by id, erroring if its type doesn't match `expected`.
    pub fn find_typed(&self, oid: &ObjectId, expected: ObjectType) -> Result<Arc<Object>, RepoError> {
        let obj = self.find_object(oid)?;
        let actual = obj.object_type();
        if actual != expected {
            return Err(RepoError::TypeMismatch {
                oid: *oid,
                expected,
                actual,
            });
        }
        Ok(obj)
    }

    /// Resolve the object a tag points to.
    pub fn resolve_tag_target(&self, tag: &Tag) -> Result<Arc<Object>, RepoError> {
        self.find_typed(&tag.target, tag.target_type)
    }

    /// Resolve a commit's root tree.
    pub fn resolve_commit_tree(&self, commit: &Commit) -> Result<Arc<Object>, RepoError> {
        self.find_typed(&commit.tree, ObjectType::Tree)
    }

    /// Resolve the `index`-th parent of a commit, if it has one.
    pub fn resolve_commit_parent(
        &self,
        commit: &Commit,
        index: usize,
    ) -> Result<Option<Arc<Object>>, RepoError> {
        match commit.parents.get(index) {
            Some(oid) => Ok(Some(self.find_typed(oid, ObjectType::Commit)?)),
            None => Ok(None),
        }
    }

    /// Resolve a tree entry's child object (a blob, a subtree, or — for
    /// submodules — the gitlink commit, which is not resolvable through this
    /// repository's object database).
    pub fn resolve_tree_entry(&self, entry: &TreeEntry) -> Result<Arc<Object>, RepoError> {
        let expected = match entry.mode {
            FileMode::Tree => ObjectType::Tree,
            FileMode::Gitlink => ObjectType::Commit,
            _ => ObjectType::Blob,
        };
        self.find_typed(&entry.oid, expected)
    }
}
