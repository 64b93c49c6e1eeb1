use std::cmp::Reverse;
use std::path::Path;

use crate::knowledge::{query_terms, KnowledgeChunk, KnowledgeSource};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
struct Chunk {
    text: String,
    lowered: String,
}

/// A CSV file split into row chunks for retrieval.
#[derive(Debug, Clone)]
pub struct CsvKnowledgeSource {
    name: String,
    columns: Vec<String>,
    row_count: usize,
    chunks: Vec<Chunk>,
}

impl CsvKnowledgeSource {
    pub fn from_path(path: &Path, chunk_rows: usize) -> AppResult<Self> {
        let read_err = |source: csv::Error| AppError::KnowledgeRead {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            let rendered = record
                .iter()
                .enumerate()
                .map(|(i, value)| match columns.get(i) {
                    Some(column) => format!("{}: {}", column, value.trim()),
                    None => value.trim().to_string(),
                })
                .collect::<Vec<_>>()
                .join(" | ");
            rows.push(rendered);
        }

        let chunk_rows = chunk_rows.max(1);
        let chunks = rows
            .chunks(chunk_rows)
            .enumerate()
            .map(|(i, block)| {
                let first = i * chunk_rows + 1;
                let last = first + block.len() - 1;
                let text = format!("Rows {}-{}:\n{}", first, last, block.join("\n"));
                let lowered = text.to_lowercase();
                Chunk { text, lowered }
            })
            .collect();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            columns,
            row_count: rows.len(),
            chunks,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

impl KnowledgeSource for CsvKnowledgeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> String {
        format!(
            "CSV file '{}' with {} rows and columns: {}",
            self.name,
            self.row_count,
            self.columns.join(", ")
        )
    }

    fn retrieve(&self, query: &str, limit: usize) -> Vec<KnowledgeChunk> {
        let terms = query_terms(query);

        let mut scored: Vec<(usize, &Chunk)> = self
            .chunks
            .iter()
            .map(|chunk| {
                let score = terms
                    .iter()
                    .filter(|t| chunk.lowered.contains(t.as_str()))
                    .count();
                (score, chunk)
            })
            .collect();

        // stable: equal scores keep file order
        scored.sort_by_key(|(score, _)| Reverse(*score));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, chunk)| KnowledgeChunk {
                source: self.name.clone(),
                text: chunk.text.clone(),
                score,
            })
            .collect()
    }
}
