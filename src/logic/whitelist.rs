//! Whitelist - folders the service should ignore once monitoring starts
//!
//! Client-owned until a start command transmits it.

use crate::error::ValidationError;

/// Ordered set of unique paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistSet {
    paths: Vec<String>,
}

impl WhitelistSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path (trimmed). Blank and duplicate paths are rejected.
    pub fn add(&mut self, path: &str) -> Result<(), ValidationError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ValidationError::EmptyWhitelistPath);
        }
        if self.contains(path) {
            return Err(ValidationError::DuplicatePath(path.to_string()));
        }
        self.paths.push(path.to_string());
        Ok(())
    }

    /// Remove a path. Returns false if it was not present.
    pub fn remove(&mut self, path: &str) -> bool {
        let path = path.trim();
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Replace with a server-provided list, dropping repeats
    pub fn replace_with(&mut self, paths: &[String]) {
        self.paths.clear();
        for path in paths {
            if !self.contains(path) {
                self.paths.push(path.clone());
            }
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.paths.clone()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
