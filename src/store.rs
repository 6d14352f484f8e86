use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::ansi::normalize;
use crate::config::JjviewConfig;
use crate::diff;
use crate::document::{assemble, Document};
use crate::vcs::JjCli;

/// Fixed prefix for document display names: "jj: <project leaf>".
pub const NAME_PREFIX: &str = "jj: ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a refresh is already running for {}", .0.display())]
    RefreshInProgress(PathBuf),

    #[error("no open document for {}", .0.display())]
    NotOpen(PathBuf),
}

/// One open project document plus its identity.
pub struct OpenDocument {
    pub name: String,
    pub root: PathBuf,
    pub document: Document,
    refreshing: bool,
}

/// Map from project root to its current document. Created on first open,
/// replaced wholesale on each refresh, destroyed on close.
pub struct DocumentStore {
    jj_bin: String,
    diff_tool: String,
    timeout: Duration,
    open: HashMap<PathBuf, OpenDocument>,
}

impl DocumentStore {
    pub fn new(config: &JjviewConfig) -> Self {
        Self {
            jj_bin: config.jj_bin.clone(),
            diff_tool: config.diff_tool.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            open: HashMap::new(),
        }
    }

    /// Open (or re-open) the project containing `path`. The repository root
    /// is resolved once here; re-opening an already-open project reuses the
    /// existing document and name.
    pub fn open(&mut self, path: &Path) -> Result<&OpenDocument> {
        let root = self
            .cli_for(path)
            .root()
            .context("could not resolve the jj repository root")?;

        if !self.open.contains_key(&root) {
            let name = name_for(&root, |candidate| self.owner_of(candidate));
            log::debug!("opening {} as {name:?}", root.display());
            self.open.insert(
                root.clone(),
                OpenDocument {
                    name,
                    root: root.clone(),
                    document: Document::empty(),
                    refreshing: false,
                },
            );
            if let Err(e) = self.refresh(&root) {
                self.open.remove(&root);
                return Err(e);
            }
        }

        self.open
            .get(&root)
            .context("open document missing after refresh")
    }

    /// Rebuild the project's document: status first, then diff, fully
    /// serialized, and swap the result in atomically. A refresh already in
    /// flight for the same root rejects this request instead of interleaving.
    pub fn refresh(&mut self, root: &Path) -> Result<()> {
        {
            let doc = self
                .open
                .get_mut(root)
                .ok_or_else(|| StoreError::NotOpen(root.to_path_buf()))?;
            if doc.refreshing {
                return Err(StoreError::RefreshInProgress(root.to_path_buf()).into());
            }
            doc.refreshing = true;
        }

        let built = self.build_document(root);

        let doc = self
            .open
            .get_mut(root)
            .ok_or_else(|| StoreError::NotOpen(root.to_path_buf()))?;
        doc.refreshing = false;
        doc.document = built?;
        Ok(())
    }

    pub fn get(&self, root: &Path) -> Option<&OpenDocument> {
        self.open.get(root)
    }

    /// Drop the project's document. Returns whether one was open.
    #[allow(dead_code)]
    pub fn close(&mut self, root: &Path) -> bool {
        self.open.remove(root).is_some()
    }

    fn build_document(&self, root: &Path) -> Result<Document> {
        let cli = self.cli_for(root);
        let status_raw = cli.status().context("jj status failed")?;
        let diff_raw = cli.diff(&self.diff_tool).context("jj diff failed")?;

        // An empty diff stream means a clean change: no file sections at all
        let records = if diff_raw.trim().is_empty() {
            Vec::new()
        } else {
            diff::parse(&diff_raw)
        };
        log::debug!(
            "assembled {} file section(s) for {}",
            records.len(),
            root.display()
        );

        let status = normalize(status_raw.trim_end());
        Ok(assemble(status, records))
    }

    fn cli_for(&self, dir: &Path) -> JjCli {
        JjCli::new(dir, &self.jj_bin, self.timeout)
    }

    fn owner_of(&self, name: &str) -> Option<PathBuf> {
        self.open
            .values()
            .find(|doc| doc.name == name)
            .map(|doc| doc.root.clone())
    }
}

/// Unique display name for a project. Base form is the fixed prefix plus the
/// final path component; collisions with documents owned by other projects
/// probe `<1>`, `<2>`, ... while a name already owned by the same project is
/// simply reused.
pub fn name_for<F>(project_root: &Path, owner_of: F) -> String
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let leaf = project_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_root.display().to_string());
    let base = format!("{NAME_PREFIX}{leaf}");

    let mut candidate = base.clone();
    let mut suffix = 0usize;
    loop {
        match owner_of(&candidate) {
            None => return candidate,
            Some(owner) if owner == project_root => return candidate,
            Some(_) => {
                suffix += 1;
                candidate = format!("{base}<{suffix}>");
            }
        }
    }
}
