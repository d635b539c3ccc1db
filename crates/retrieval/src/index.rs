//! In-memory document index with a persisted JSON representation.
//!
//! The inverted keyword index (word -> { doc_id -> count }) is rebuilt on
//! load rather than persisted; only the documents themselves go to disk.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use tt_domain::error::{Error, Result};

use crate::math::cosine_similarity;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An indexed passage with its text and dense embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Where the text came from (file name, page label, ...).
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A retrieved passage, as returned to tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub source: String,
    pub text: String,
}

impl From<&Document> for Passage {
    fn from(d: &Document) -> Self {
        Passage {
            id: d.id.clone(),
            source: d.source.clone(),
            text: d.text.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DocumentIndex
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct DocumentIndex {
    docs: RwLock<Vec<Document>>,
    /// word -> { doc index -> count }
    keyword_index: RwLock<HashMap<String, HashMap<usize, usize>>>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            keyword_index: RwLock::new(HashMap::new()),
        }
    }

    /// Load a persisted index. A missing file yields an empty index; a
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let index = Self::new();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no document index on disk, starting empty");
            return Ok(index);
        }
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let docs: Vec<Document> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        for doc in docs {
            index.add(doc);
        }
        tracing::info!(
            docs = index.docs.read().len(),
            words = index.keyword_index.read().len(),
            "document index loaded"
        );
        Ok(index)
    }

    /// Persist the documents via a `.tmp` sibling + rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        let json = serde_json::to_string(&*self.docs.read())?;
        let tmp_name = format!(
            ".{}.{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            uuid::Uuid::new_v4().as_simple()
        );
        let tmp_path = path.with_file_name(tmp_name);
        let mut file = std::fs::File::create(&tmp_path).map_err(Error::Io)?;
        file.write_all(json.as_bytes()).map_err(Error::Io)?;
        file.sync_data().map_err(Error::Io)?;
        std::fs::rename(&tmp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::Io(e)
        })
    }

    /// Add a document and index its text.
    pub fn add(&self, doc: Document) {
        let words = tokenize(&doc.text);
        let mut docs = self.docs.write();
        let mut kw = self.keyword_index.write();
        let doc_idx = docs.len();
        for word in words {
            *kw.entry(word).or_default().entry(doc_idx).or_insert(0) += 1;
        }
        docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Keyword ranking: documents matching any query word, scored by total
    /// match count descending.
    pub fn keyword_search(&self, query: &str, limit: usize) -> Vec<Passage> {
        let query_words = tokenize(query);
        if query_words.is_empty() {
            return vec![];
        }

        let kw = self.keyword_index.read();
        let mut scores: HashMap<usize, usize> = HashMap::new();
        for word in &query_words {
            if let Some(matches) = kw.get(word) {
                for (&doc_idx, &count) in matches {
                    *scores.entry(doc_idx).or_insert(0) += count;
                }
            }
        }

        let docs = self.docs.read();
        let mut ranked: Vec<_> = scores.into_iter().collect();
        // Stable order: score desc, then doc id asc for ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| docs[a.0].id.cmp(&docs[b.0].id)));
        ranked.truncate(limit);
        ranked.into_iter().map(|(i, _)| (&docs[i]).into()).collect()
    }

    /// Dense ranking: cosine similarity against each stored embedding.
    pub fn vector_search(&self, query_embedding: &[f32], limit: usize) -> Vec<Passage> {
        if query_embedding.is_empty() {
            return vec![];
        }
        let docs = self.docs.read();
        let mut scored: Vec<(usize, f32)> = docs
            .iter()
            .enumerate()
            .map(|(i, d)| (i, cosine_similarity(query_embedding, &d.embedding)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| docs[a.0].id.cmp(&docs[b.0].id))
        });
        scored.truncate(limit);
        scored.into_iter().map(|(i, _)| (&docs[i]).into()).collect()
    }

    /// Hybrid query: interleave the keyword and vector rankings, dedupe by
    /// document id, truncate to `k`.
    pub fn hybrid_search(
        &self,
        query: &str,
        query_embedding: &[f32],
        candidates_per_ranking: usize,
        k: usize,
    ) -> Vec<Passage> {
        let by_keyword = self.keyword_search(query, candidates_per_ranking);
        let by_vector = self.vector_search(query_embedding, candidates_per_ranking);

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();

        let mut kw_iter = by_keyword.into_iter();
        let mut vec_iter = by_vector.into_iter();
        loop {
            let mut advanced = false;
            for next in [kw_iter.next(), vec_iter.next()] {
                if let Some(p) = next {
                    advanced = true;
                    if seen.insert(p.id.clone()) {
                        merged.push(p);
                    }
                }
            }
            if !advanced || merged.len() >= k {
                break;
            }
        }
        merged.truncate(k);
        merged
    }
}

impl Default for DocumentIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tokenize text into lowercase alphanumeric words (minimum 2 characters).
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(String::from)
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
