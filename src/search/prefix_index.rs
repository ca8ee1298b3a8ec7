//! An inverted index over food names and alternate names, answering
//! all-terms prefix queries with a BM25 relevance score.
#![forbid(unsafe_code)]

use crate::models::{FoodCategory, LocalFoodRecord};
use crate::search::store::MatchExpression;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Bumped whenever the on-disk layout changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.75;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
struct Posting {
    doc: u32,
    term_freq: u16,
}

/// What the index remembers about each dataset row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndexedDoc {
    pub key: String,
    pub category: FoodCategory,
    len: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrefixIndex {
    version: u32,
    docs: Vec<IndexedDoc>,
    /// Sorted, so all terms sharing a prefix are one contiguous range.
    terms: BTreeMap<String, Vec<Posting>>,
    avg_doc_len: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc: usize,
    pub score: f64,
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    // Best first: higher score, then earlier dataset row.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc.cmp(&other.doc))
    }
}

/// Lowercased alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl PrefixIndex {
    pub fn build(records: &[LocalFoodRecord]) -> Self {
        let tokenized: Vec<Vec<String>> = records
            .par_iter()
            .map(|r| {
                let mut tokens = tokenize(&r.name);
                tokens.extend(tokenize(&r.alternate_names));
                tokens
            })
            .collect();

        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut docs = Vec::with_capacity(records.len());
        let mut total_len = 0usize;

        for (doc, (record, tokens)) in records.iter().zip(tokenized.iter()).enumerate() {
            let mut counts: HashMap<&str, u16> = HashMap::new();
            for token in tokens {
                let count = counts.entry(token.as_str()).or_insert(0);
                *count = count.saturating_add(1);
            }
            for (term, term_freq) in counts {
                terms.entry(term.to_string()).or_default().push(Posting {
                    doc: doc as u32,
                    term_freq,
                });
            }
            total_len += tokens.len();
            docs.push(IndexedDoc {
                key: record.food_id.clone(),
                category: record.category,
                len: tokens.len() as u32,
            });
        }

        let avg_doc_len = if docs.is_empty() || total_len == 0 {
            1.0
        } else {
            total_len as f64 / docs.len() as f64
        };

        Self {
            version: INDEX_FORMAT_VERSION,
            docs,
            terms,
            avg_doc_len,
        }
    }

    /// Documents containing a word starting with every term of `expression`,
    /// best first.
    pub fn search(&self, expression: &MatchExpression) -> Vec<ScoredDoc> {
        let total_docs = self.docs.len() as f64;
        if self.docs.is_empty() {
            return Vec::new();
        }

        let mut scores: Option<HashMap<u32, f64>> = None;
        for prefix in expression.terms() {
            let mut freqs: HashMap<u32, u32> = HashMap::new();
            for (_, postings) in self
                .terms
                .range(prefix.clone()..)
                .take_while(|(term, _)| term.starts_with(prefix.as_str()))
            {
                for posting in postings {
                    *freqs.entry(posting.doc).or_insert(0) += u32::from(posting.term_freq);
                }
            }
            if freqs.is_empty() {
                return Vec::new();
            }

            let doc_freq = freqs.len() as f64;
            let idf = (1.0 + (total_docs - doc_freq + 0.5) / (doc_freq + 0.5)).ln();
            let term_scores = freqs
                .into_iter()
                .map(|(doc, tf)| (doc, idf * self.saturated_tf(doc, f64::from(tf))));

            scores = Some(match scores.take() {
                None => term_scores.collect(),
                Some(mut acc) => {
                    let term_scores: HashMap<u32, f64> = term_scores.collect();
                    acc.retain(|doc, _| term_scores.contains_key(doc));
                    for (doc, score) in acc.iter_mut() {
                        *score += term_scores.get(doc).copied().unwrap_or(0.0);
                    }
                    acc
                }
            });
            if scores.as_ref().is_some_and(HashMap::is_empty) {
                return Vec::new();
            }
        }

        let mut ranked: Vec<ScoredDoc> = scores
            .unwrap_or_default()
            .into_iter()
            .map(|(doc, score)| ScoredDoc {
                doc: doc as usize,
                score,
            })
            .collect();
        ranked.sort();
        ranked
    }

    fn saturated_tf(&self, doc: u32, tf: f64) -> f64 {
        let len = self
            .docs
            .get(doc as usize)
            .map_or(self.avg_doc_len, |d| f64::from(d.len));
        let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * len / self.avg_doc_len);
        tf * (BM25_K1 + 1.0) / (tf + norm)
    }

    pub fn doc(&self, doc: usize) -> Option<&IndexedDoc> {
        self.docs.get(doc)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// The index must have been built from exactly these records, in this order.
    pub fn validate_against(&self, records: &[LocalFoodRecord]) -> Result<()> {
        if self.docs.len() != records.len() {
            anyhow::bail!(
                "Document count mismatch: index has {}, dataset has {}",
                self.docs.len(),
                records.len()
            );
        }
        if let Some((pos, (doc, record))) = self
            .docs
            .iter()
            .zip(records)
            .enumerate()
            .find(|(_, (doc, record))| doc.key != record.food_id)
        {
            anyhow::bail!(
                "Key mismatch at row {}: index has {:?}, dataset has {:?}",
                pos,
                doc.key,
                record.food_id
            );
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self).context("Failed to serialize prefix index")?;
        fs::write(path, bytes).with_context(|| format!("Failed to write prefix index to {:?}", path))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read prefix index at {:?}", path))?;
        let index: PrefixIndex = bincode::deserialize(&bytes)
            .with_context(|| format!("Prefix index at {:?} is corrupt", path))?;
        if index.version != INDEX_FORMAT_VERSION {
            anyhow::bail!(
                "Index format version mismatch: file has {}, expected {}",
                index.version,
                INDEX_FORMAT_VERSION
            );
        }
        Ok(index)
    }
}
