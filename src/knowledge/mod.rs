//! Knowledge Sources
//!
//! File-backed data the agents can consult while working on a task. Only CSV
//! files are wired in; Excel and PDF files are recognised but skipped until
//! their adapters exist.

pub mod csv_source;

pub use csv_source::CsvKnowledgeSource;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::{AppError, AppResult};
use tracing::{debug, info};

/// A slice of a knowledge source handed to an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeChunk {
    pub source: String,
    pub text: String,
    pub score: usize,
}

pub trait KnowledgeSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Short description of the data (schema, size).
    fn summary(&self) -> String;

    /// Up to `limit` chunks most relevant to `query`, best first.
    fn retrieve(&self, query: &str, limit: usize) -> Vec<KnowledgeChunk>;
}

/// Knowledge shared by every agent of one pipeline.
pub type SharedKnowledge = Arc<Vec<Box<dyn KnowledgeSource>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeKind {
    Csv,
    Excel,
    Pdf,
}

impl KnowledgeKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(KnowledgeKind::Csv),
            "xlsx" | "xls" => Some(KnowledgeKind::Excel),
            "pdf" => Some(KnowledgeKind::Pdf),
            _ => None,
        }
    }
}

/// Whether `path` names a CSV file, ignoring extension case.
pub fn is_csv(path: &Path) -> bool {
    KnowledgeKind::from_path(path) == Some(KnowledgeKind::Csv)
}

/// Lowercase alphanumeric words of at least three characters, deduplicated.
pub(crate) fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
    {
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}

fn resolve(knowledge_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        knowledge_dir.join(path)
    }
}

/// Build knowledge sources for a file or folder. Relative paths resolve
/// against `knowledge_dir`. Folders contribute every CSV they contain, in
/// directory-listing order.
pub fn load_knowledge(
    knowledge_dir: &Path,
    path: &Path,
    chunk_rows: usize,
) -> AppResult<SharedKnowledge> {
    let resolved = resolve(knowledge_dir, path);

    if !resolved.exists() {
        return Err(AppError::NotFound(format!(
            "Knowledge path not found: {}",
            resolved.display()
        )));
    }

    let candidates: Vec<PathBuf> = if resolved.is_dir() {
        std::fs::read_dir(&resolved)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect()
    } else {
        vec![resolved.clone()]
    };

    let mut sources: Vec<Box<dyn KnowledgeSource>> = Vec::new();
    for candidate in candidates {
        match KnowledgeKind::from_path(&candidate) {
            Some(KnowledgeKind::Csv) => {
                sources.push(Box::new(CsvKnowledgeSource::from_path(&candidate, chunk_rows)?));
            }
            Some(kind) => {
                debug!(path = %candidate.display(), ?kind, "Knowledge format not enabled, skipping");
            }
            None => {
                debug!(path = %candidate.display(), "Not a knowledge file, skipping");
            }
        }
    }

    if sources.is_empty() {
        return Err(AppError::NoKnowledgeSources(
            "No valid knowledge sources found in the specified folder.".to_string(),
        ));
    }

    info!(
        path = %resolved.display(),
        sources = sources.len(),
        "Knowledge sources loaded"
    );

    Ok(Arc::new(sources))
}
