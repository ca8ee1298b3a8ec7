//! The read-only local dataset as seen by local search.

use crate::errors::StoreError;
use crate::models::{FoodCategory, LocalFoodRecord};
use crate::search::prefix_index::PrefixIndex;
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Prefix terms for the full-text index; every term must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchExpression {
    terms: Vec<String>,
}

impl MatchExpression {
    /// Keeps only alphanumeric characters of each token. `None` when nothing
    /// indexable is left.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        let terms: Vec<String> = tokens
            .iter()
            .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Self { terms })
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.terms.iter().map(|t| format!("{t}*")).collect();
        f.write_str(&rendered.join(" "))
    }
}

/// One token of a substring search: matches if either the word or its stem
/// occurs in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTerm {
    pub word: String,
    pub stem: String,
}

impl PatternTerm {
    pub fn new(token: &str) -> Self {
        let word = token.to_lowercase();
        let stem = naive_stem(&word);
        Self { word, stem }
    }

    /// `text` must already be lowercase.
    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.word) || text.contains(&self.stem)
    }
}

/// "potatoes" → "potato", "berries" → "berry", "eggs" → "egg". Words ending
/// in "ss" and short words are left alone.
pub fn naive_stem(word: &str) -> String {
    let len = word.chars().count();
    if len > 4 && word.ends_with("oes") {
        word[..word.len() - 2].to_string()
    } else if len > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// A record key returned by the index with what is needed to order it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub key: String,
    pub category: FoodCategory,
    /// Higher is more relevant.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexLookup {
    /// Matches in relevance order, best first.
    Hits(Vec<IndexHit>),
    /// The index is missing or unusable; callers should fall back.
    Unavailable(String),
}

pub trait FoodStore: Send + Sync {
    fn match_prefix(&self, expression: &MatchExpression) -> Result<IndexLookup, StoreError>;

    /// Records where every term matches the name or the alternate names.
    fn pattern_match(&self, terms: &[PatternTerm]) -> Result<Vec<LocalFoodRecord>, StoreError>;

    /// Records for `keys`, in the order requested. Unknown keys are skipped.
    fn get_many(&self, keys: &[String]) -> Result<Vec<LocalFoodRecord>, StoreError>;

    fn find_by_barcode(&self, barcode: &str) -> Result<Option<LocalFoodRecord>, StoreError>;
}

#[derive(Debug)]
struct SearchableText {
    name: String,
    alternate_names: String,
}

/// The whole dataset held in memory, with an optional prefix index.
#[derive(Debug)]
pub struct MemoryFoodStore {
    records: Vec<LocalFoodRecord>,
    searchable: Vec<SearchableText>,
    by_key: HashMap<String, usize>,
    by_barcode: HashMap<String, usize>,
    index: Option<PrefixIndex>,
}

impl MemoryFoodStore {
    /// A store without an index; searches use the pattern path until one is attached.
    pub fn new(records: Vec<LocalFoodRecord>) -> Self {
        let searchable = records
            .par_iter()
            .map(|r| SearchableText {
                name: r.name.to_lowercase(),
                alternate_names: r.alternate_names.to_lowercase(),
            })
            .collect();

        let mut by_key = HashMap::with_capacity(records.len());
        let mut by_barcode = HashMap::new();
        for (pos, record) in records.iter().enumerate() {
            by_key.entry(record.food_id.clone()).or_insert(pos);
            if let Some(code) = record.barcode.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                by_barcode.entry(code.to_string()).or_insert(pos);
            }
        }

        Self {
            records,
            searchable,
            by_key,
            by_barcode,
            index: None,
        }
    }

    pub fn with_built_index(records: Vec<LocalFoodRecord>) -> Self {
        let mut store = Self::new(records);
        store.index = Some(PrefixIndex::build(&store.records));
        store
    }

    /// Attaches a previously saved index after checking it was built from
    /// this exact dataset.
    pub fn attach_index(&mut self, index: PrefixIndex) -> Result<()> {
        index.validate_against(&self.records)?;
        info!(documents = index.len(), "Prefix index attached");
        self.index = Some(index);
        Ok(())
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn records(&self) -> &[LocalFoodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FoodStore for MemoryFoodStore {
    fn match_prefix(&self, expression: &MatchExpression) -> Result<IndexLookup, StoreError> {
        let Some(index) = self.index.as_ref() else {
            return Ok(IndexLookup::Unavailable("prefix index not built".to_string()));
        };
        let hits = index
            .search(expression)
            .into_iter()
            .filter_map(|scored| {
                index.doc(scored.doc).map(|doc| IndexHit {
                    key: doc.key.clone(),
                    category: doc.category,
                    score: scored.score,
                })
            })
            .collect();
        Ok(IndexLookup::Hits(hits))
    }

    fn pattern_match(&self, terms: &[PatternTerm]) -> Result<Vec<LocalFoodRecord>, StoreError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .par_iter()
            .zip(self.searchable.par_iter())
            .filter(|(_, text)| {
                terms
                    .iter()
                    .all(|term| term.matches(&text.name) || term.matches(&text.alternate_names))
            })
            .map(|(record, _)| record.clone())
            .collect())
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<LocalFoodRecord>, StoreError> {
        Ok(keys
            .iter()
            .filter_map(|key| self.by_key.get(key))
            .map(|&pos| self.records[pos].clone())
            .collect())
    }

    fn find_by_barcode(&self, barcode: &str) -> Result<Option<LocalFoodRecord>, StoreError> {
        Ok(self
            .by_barcode
            .get(barcode.trim())
            .map(|&pos| self.records[pos].clone()))
    }
}
