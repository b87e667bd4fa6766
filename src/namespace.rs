//! The in-memory path index: which paths are directories, and which storage
//! servers host each file.
//!
//! Bookkeeping rules, holding at every quiescent point:
//! - every strict ancestor of an indexed path is recorded as a directory;
//! - no file's host set is empty;
//! - `create_*` and `delete` keep a path in exactly one of the two
//!   structures. Registration may record an advertised file's ancestor as a
//!   directory even when that ancestor is itself an advertised file; the
//!   directory reading wins for such paths.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::naming::{NamingError, NamingResult};
use crate::path::FsPath;
use crate::storage::StorageNode;

#[derive(Debug)]
pub struct Namespace {
    directories: HashSet<FsPath>,
    files: HashMap<FsPath, Vec<StorageNode>>,
}

impl Namespace {
    pub fn new() -> Self {
        let mut directories = HashSet::new();
        directories.insert(FsPath::root());
        Self { directories, files: HashMap::new() }
    }

    pub fn has_path(&self, path: &FsPath) -> bool {
        self.directories.contains(path) || self.files.contains_key(path)
    }

    pub fn is_known_directory(&self, path: &FsPath) -> bool {
        self.directories.contains(path)
    }

    /// True for a directory, false for a file, `NotFound` otherwise.
    pub fn is_directory(&self, path: &FsPath) -> NamingResult<bool> {
        if self.directories.contains(path) {
            Ok(true)
        } else if self.files.contains_key(path) {
            Ok(false)
        } else {
            Err(NamingError::NotFound)
        }
    }

    /// Child component names of `dir`, sorted and de-duplicated.
    pub fn list_children(&self, dir: &FsPath) -> NamingResult<Vec<String>> {
        if !self.directories.contains(dir) {
            return Err(NamingError::NotFound);
        }
        let mut names = BTreeSet::new();
        for path in self.directories.iter().chain(self.files.keys()) {
            if path.parent().as_ref() == Some(dir) {
                if let Some(name) = path.last() {
                    names.insert(name.to_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Records a new file. The caller has validated that the parent is a
    /// directory and the path itself is unused.
    pub fn insert_file(&mut self, path: FsPath, node: StorageNode) {
        self.files.insert(path, vec![node]);
    }

    /// Records a new directory, caller-validated like
    /// [`Namespace::insert_file`].
    pub fn insert_directory(&mut self, path: FsPath) {
        self.directories.insert(path);
    }

    /// Registration-time insert: records the file and walks its ancestors
    /// bottom-up, adding each missing one as a directory until an existing
    /// directory entry is hit.
    pub fn graft_file(&mut self, path: FsPath, node: StorageNode) {
        let prefixes = path.prefixes();
        for ancestor in prefixes[..prefixes.len() - 1].iter().rev() {
            if self.directories.contains(ancestor) {
                break;
            }
            self.directories.insert(ancestor.clone());
        }
        self.files.insert(path, vec![node]);
    }

    pub fn hosts(&self, path: &FsPath) -> Option<&[StorageNode]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn hosts_mut(&mut self, path: &FsPath) -> Option<&mut Vec<StorageNode>> {
        self.files.get_mut(path)
    }

    /// Removes `root` and everything beneath it, returning the distinct
    /// nodes that hosted any removed file.
    pub fn remove_subtree(&mut self, root: &FsPath) -> Vec<StorageNode> {
        self.directories.retain(|path| !path.is_subpath_of(root));
        let doomed: Vec<FsPath> =
            self.files.keys().filter(|path| path.is_subpath_of(root)).cloned().collect();
        let mut victims: Vec<StorageNode> = Vec::new();
        for path in doomed {
            if let Some(nodes) = self.files.remove(&path) {
                for node in nodes {
                    if !victims.contains(&node) {
                        victims.push(node);
                    }
                }
            }
        }
        victims
    }

    #[cfg(test)]
    pub(crate) fn directories(&self) -> &HashSet<FsPath> {
        &self.directories
    }

    #[cfg(test)]
    pub(crate) fn files(&self) -> &HashMap<FsPath, Vec<StorageNode>> {
        &self.files
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
