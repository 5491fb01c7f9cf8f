//! Most-recently-used work files.

use serde::{Deserialize, Serialize};

/// Default number of paths kept.
pub const MAX_RECENT_COUNT: usize = 5;

/// Distinct paths, most recent first, capped at `limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentFiles {
    paths: Vec<String>,
    #[serde(skip, default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    MAX_RECENT_COUNT
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::with_limit(MAX_RECENT_COUNT)
    }
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            paths: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Move `path` to the front, inserting it if absent. Returns false for an
    /// empty path, which is ignored.
    pub fn add(&mut self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        self.paths.retain(|p| p != path);
        self.paths.insert(0, path.to_string());
        self.paths.truncate(self.limit);
        true
    }

    /// Drop `path` if present. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    /// Swap the contents for `paths` without replacing the container. Blank
    /// and duplicate entries are dropped and the limit still applies.
    pub fn replace_all(&mut self, paths: impl IntoIterator<Item = String>) {
        self.paths.clear();
        for path in paths {
            if !path.is_empty() && !self.paths.contains(&path) {
                self.paths.push(path);
            }
        }
        self.paths.truncate(self.limit);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
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

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_moves_existing_to_front() {
        let mut recent = RecentFiles::new();
        recent.add("/a");
        recent.add("/b");
        recent.add("/a");

        assert_eq!(recent.as_slice(), ["/a", "/b"]);
    }

    #[test]
    fn test_repeated_add_is_stable() {
        let mut recent = RecentFiles::new();
        recent.add("/a");
        recent.add("/b");
        for _ in 0..3 {
            recent.add("/b");
            assert_eq!(recent.len(), 2);
            assert_eq!(recent.as_slice()[0], "/b");
        }
    }

    #[test]
    fn test_capped_at_five() {
        let mut recent = RecentFiles::new();
        for i in 0..8 {
            recent.add(&format!("/file{i}"));
        }

        assert_eq!(recent.len(), 5);
        assert_eq!(recent.as_slice()[0], "/file7");
        assert_eq!(recent.as_slice()[4], "/file3");
    }

    #[test]
    fn test_empty_path_is_ignored() {
        let mut recent = RecentFiles::new();
        assert!(!recent.add(""));
        assert!(recent.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut recent = RecentFiles::new();
        recent.add("/a");
        recent.add("/b");

        assert!(recent.remove("/a"));
        assert!(!recent.remove("/missing"));
        assert_eq!(recent.as_slice(), ["/b"]);
    }

    #[test]
    fn test_replace_all_dedupes_and_truncates() {
        let mut recent = RecentFiles::new();
        recent.add("/old");

        let incoming = ["/a", "/b", "", "/a", "/c", "/d", "/e", "/f"].map(String::from);
        recent.replace_all(incoming);

        assert_eq!(recent.as_slice(), ["/a", "/b", "/c", "/d", "/e"]);
    }

    #[test]
    fn test_deserialize_from_plain_array() {
        let recent: RecentFiles = serde_json::from_str(r#"["/x", "/y"]"#).unwrap();
        assert_eq!(recent.as_slice(), ["/x", "/y"]);
        assert_eq!(recent.limit(), MAX_RECENT_COUNT);
    }
}
