//! TF-IDF vectorization of movie documents.
//!
//! Weighting:
//! - tf = raw term count in the document
//! - idf = ln((1 + n) / (1 + df)) + 1 (smoothed, never zero)
//! - every row is L2-normalised, so cosine similarity is a plain dot product
//!
//! Rust concepts you'll learn:
//! - `FromStr` for parsing configuration values into enums
//! - Sparse vectors as parallel index/value arrays
//! - Rayon `par_iter` for scoring every document at once

use crate::stopwords;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which stop-word list to apply before counting terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopWords {
    #[default]
    English,
    None,
}

impl FromStr for StopWords {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(StopWords::English),
            "none" | "" => Ok(StopWords::None),
            other => Err(format!("unknown stop-word setting '{}'", other)),
        }
    }
}

impl fmt::Display for StopWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopWords::English => write!(f, "english"),
            StopWords::None => write!(f, "none"),
        }
    }
}

/// Split text into lowercase tokens of two or more word characters
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
}

/// One L2-normalised document vector. `indices` are ascending term ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    /// Number of stored (non-zero) terms
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Dot product against a dense vector of vocabulary size
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&i, &v)| v * dense[i])
            .sum()
    }
}

/// Fits a vocabulary over a document collection and weights each document.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    stop_words: StopWords,
}

impl TfidfVectorizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let stop = stopwords::english();
        tokenize(text)
            .filter(|token| match self.stop_words {
                StopWords::English => !stop.contains(token.as_str()),
                StopWords::None => true,
            })
            .collect()
    }

    /// Fit the vocabulary on `documents` and return their weighted rows
    pub fn fit_transform<S: AsRef<str> + Sync>(&self, documents: &[S]) -> TfidfMatrix {
        // Term counts per document, in parallel
        let counts: Vec<BTreeMap<String, usize>> = documents
            .par_iter()
            .map(|doc| {
                let mut counts = BTreeMap::new();
                for term in self.terms(doc.as_ref()) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // Vocabulary in sorted term order, with document frequencies
        let terms: BTreeSet<&String> = counts.iter().flat_map(|c| c.keys()).collect();
        let vocabulary: BTreeMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for doc in &counts {
            for term in doc.keys() {
                if let Some(&i) = vocabulary.get(term) {
                    df[i] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .par_iter()
            .map(|doc| {
                let mut row = SparseRow::default();
                // BTreeMap iteration is sorted by term, and term ids follow term order
                for (term, &count) in doc {
                    if let Some(&i) = vocabulary.get(term) {
                        row.indices.push(i);
                        row.values.push(count as f64 * idf[i]);
                    }
                }
                let norm = row.values.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.values.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        TfidfMatrix { vocabulary, idf, rows }
    }
}

/// Weighted document rows plus the fitted vocabulary
#[derive(Debug, Clone, Default)]
pub struct TfidfMatrix {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseRow>,
}

impl TfidfMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn row(&self, i: usize) -> Option<&SparseRow> {
        self.rows.get(i)
    }

    /// Cosine similarity of row `i` against every row, in row order.
    ///
    /// Returns `None` if `i` is out of range.
    pub fn similarity_row(&self, i: usize) -> Option<Vec<f64>> {
        let seed = self.rows.get(i)?;
        let mut dense = vec![0.0; self.vocabulary.len()];
        for (&idx, &v) in seed.indices.iter().zip(&seed.values) {
            dense[idx] = v;
        }
        Some(self.rows.par_iter().map(|row| row.dot_dense(&dense)).collect())
    }
}
