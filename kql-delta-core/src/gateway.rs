//! Script file access.
//!
//! Reads and writes script files, and walks script folders lazily so large
//! trees are read one file at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File access rooted at a base folder. Relative paths resolve against it.
#[derive(Debug, Clone, Default)]
pub struct FileGateway {
    root: PathBuf,
}

/// One script read during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub path: PathBuf,
    pub content: String,
}

impl FileGateway {
    /// Gateway rooted at the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Gateway rooted at `folder`, relative to this gateway's root.
    pub fn change_folder(&self, folder: impl AsRef<Path>) -> Self {
        Self {
            root: self.resolve(folder),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub async fn read_script(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(path);
        let content = tokio::fs::read_to_string(&path).await?;
        log::debug!("Read script; path={}, bytes={}", path.display(), content.len());
        Ok(content)
    }

    /// Write a script, creating missing parent folders.
    pub async fn write_script(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        let path = self.resolve(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&path, content).await?;
        log::debug!("Wrote script; path={}, bytes={}", path.display(), content.len());
        Ok(())
    }

    /// Walk `folder` depth-first: the files of a folder in name order, then
    /// each sub-folder in name order. With `extensions`, only files ending
    /// in one of them are read; without, every file is.
    pub fn walk(&self, folder: impl AsRef<Path>, extensions: Option<&[String]>) -> ScriptWalker {
        ScriptWalker {
            start: Some(self.resolve(folder)),
            extensions: extensions.map(|e| e.to_vec()),
            stack: Vec::new(),
        }
    }
}

/// Files and sub-folders of one folder still to visit.
#[derive(Debug, Default)]
struct Frame {
    files: VecDeque<PathBuf>,
    folders: VecDeque<PathBuf>,
}

/// Lazy folder walk; see [`FileGateway::walk`].
///
/// Nothing is read until [`next`](Self::next) is called. Dropping the walker
/// stops the walk.
#[derive(Debug)]
pub struct ScriptWalker {
    start: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    stack: Vec<Frame>,
}

impl ScriptWalker {
    /// Read the next matching script, or `None` once the walk is complete.
    pub async fn next(&mut self) -> Result<Option<ScriptEntry>> {
        if let Some(start) = self.start.take() {
            let frame = self.list(&start).await?;
            self.stack.push(frame);
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            if let Some(path) = frame.files.pop_front() {
                let content = tokio::fs::read_to_string(&path).await?;
                log::debug!("Walked script; path={}", path.display());
                return Ok(Some(ScriptEntry { path, content }));
            }
            if let Some(folder) = frame.folders.pop_front() {
                let frame = self.list(&folder).await?;
                self.stack.push(frame);
                continue;
            }
            self.stack.pop();
        }
    }

    /// Drain the walk into a list.
    pub async fn collect(mut self) -> Result<Vec<ScriptEntry>> {
        let mut scripts = Vec::new();
        while let Some(script) = self.next().await? {
            scripts.push(script);
        }
        Ok(scripts)
    }

    async fn list(&self, folder: &Path) -> Result<Frame> {
        let mut files = Vec::new();
        let mut folders = Vec::new();

        let mut entries = tokio::fs::read_dir(folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                folders.push(path);
            } else if self.matches(&path) {
                files.push(path);
            }
        }

        files.sort();
        folders.sort();
        Ok(Frame {
            files: files.into(),
            folders: folders.into(),
        })
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(extensions) = &self.extensions else {
            return true;
        };
        let name = path.to_string_lossy();
        extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext.trim_start_matches('.'))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(gateway: &FileGateway, scripts: &[ScriptEntry]) -> Vec<String> {
        scripts
            .iter()
            .map(|s| {
                s.path
                    .strip_prefix(gateway.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway
            .write_script("out/functions/create/F1.kql", ".create function F1() { 1 }")
            .await
            .unwrap();
        let content = gateway
            .read_script("out/functions/create/F1.kql")
            .await
            .unwrap();
        assert_eq!(content, ".create function F1() { 1 }");
    }

    #[tokio::test]
    async fn test_walk_order_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        for path in [
            "b.kql",
            "a.kql",
            "notes.txt",
            "z/inner.csl",
            "m/deep/x.kql",
            "m/c.kql",
        ] {
            gateway.write_script(path, "").await.unwrap();
        }

        let extensions = vec!["kql".to_string(), "csl".to_string()];
        let scripts = gateway.walk("", Some(extensions.as_slice())).collect().await.unwrap();
        assert_eq!(
            names(&gateway, &scripts),
            vec!["a.kql", "b.kql", "m/c.kql", "m/deep/x.kql", "z/inner.csl"]
        );

        let all = gateway.walk("", None).collect().await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_walk_is_lazy_and_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway.write_script("s/one.kql", "1").await.unwrap();
        gateway.write_script("s/two.kql", "2").await.unwrap();

        let folder = gateway.change_folder("s");
        let mut walker = folder.walk("", None);
        let first = walker.next().await.unwrap().unwrap();
        assert_eq!(first.content, "1");
        drop(walker);

        let again = folder.walk("", None).collect().await.unwrap();
        assert_eq!(again.len(), 2);
    }

    #[tokio::test]
    async fn test_walk_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        let mut walker = gateway.walk("missing", None);
        assert!(walker.next().await.is_err());
    }

    #[tokio::test]
    async fn test_walk_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        let mut walker = gateway.walk("", None);
        assert!(walker.next().await.unwrap().is_none());
        assert!(walker.next().await.unwrap().is_none());
    }
}
