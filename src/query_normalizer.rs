//! Reduces a free-text food phrase ("2 cups of brown rice") to search tokens.
//!
//! The vocabulary tables are fixed at startup and only ever read, so any
//! number of searches can normalize concurrently.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

lazy_static! {
    /// Words that carry no food meaning.
    static ref FILLER_WORDS: HashSet<&'static str> = [
        "a", "an", "the", "some", "of", "with", "and", "my", "fresh",
        "organic", "large", "medium", "small", "big", "little", "extra",
        "hot", "cold", "warm", "homemade", "store", "bought",
    ]
    .into_iter()
    .collect();

    static ref UNIT_WORDS: HashSet<&'static str> = [
        "cup", "cups", "tbsp", "tablespoon", "tablespoons",
        "tsp", "teaspoon", "teaspoons", "oz", "ounce", "ounces",
        "lb", "lbs", "pound", "pounds", "g", "gram", "grams",
        "kg", "ml", "l", "liter", "liters",
        "slice", "slices", "piece", "pieces", "serving", "servings",
        "bowl", "bowls", "handful", "handfuls", "scoop", "scoops",
        "can", "cans", "bottle", "bottles", "package", "packages", "pkg",
        "container", "bar", "bars",
    ]
    .into_iter()
    .collect();

    /// Shorthand → full phrase. No expansion may contain a key of this table.
    static ref SHORTHAND_ALIASES: HashMap<&'static str, &'static str> = [
        ("pb", "peanut butter"),
        ("pb&j", "peanut butter"),
        ("oj", "orange juice"),
        ("evoo", "olive oil"),
        ("ff", "fat free"),
        ("lf", "low fat"),
        ("ww", "whole wheat"),
        ("gf", "gluten free"),
        ("spud", "potato"),
        ("spuds", "potatoes"),
        ("yam", "sweet potato"),
        ("yams", "sweet potatoes"),
    ]
    .into_iter()
    .collect();
}

const VULGAR_FRACTIONS: &[char] = &['½', '¼', '¾', '⅓', '⅔', '⅛', '⅜', '⅝', '⅞'];

// "a half" must be tried before "half".
const LEADING_NUMBER_WORDS: &[&str] = &[
    "a half", "half", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// An ordered, never-empty list of search tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery(Vec<String>);

impl NormalizedQuery {
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last_token(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Tokens joined with single spaces, as sent to keyword search APIs.
    pub fn phrase(&self) -> String {
        self.0.join(" ")
    }

    /// A query holding just the final token, used for the "everything bagel" → "bagel" retry.
    pub fn last_only(&self) -> Option<NormalizedQuery> {
        if self.0.len() < 2 {
            return None;
        }
        self.0.last().map(|t| NormalizedQuery(vec![t.clone()]))
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phrase())
    }
}

/// Normalizes `raw` into search tokens. Returns `None` only when `raw` is blank.
pub fn normalize(raw: &str) -> Option<NormalizedQuery> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();

    if let Some(phrase) = SHORTHAND_ALIASES.get(lowered.as_str()) {
        return Some(NormalizedQuery(split_phrase(phrase)));
    }

    let mut tokens = filter_words(strip_leading(&lowered));
    // Dropping fillers can leave a quantity or number word at the head
    // ("the 2% milk"), so strip again until the phrase is stable.
    loop {
        let phrase = tokens.join(" ");
        let stripped = strip_leading(&phrase);
        if stripped.len() == phrase.len() {
            break;
        }
        tokens = filter_words(stripped);
    }

    if tokens.is_empty() {
        tokens.push(trimmed.to_string());
    }
    Some(NormalizedQuery(tokens))
}

/// Splits on whitespace, expanding aliases and dropping filler, unit and
/// quantity words.
fn filter_words(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let word = word.trim_end_matches(|c: char| matches!(c, '.' | ',' | '!' | '?'));
        if word.is_empty() {
            continue;
        }
        if let Some(phrase) = SHORTHAND_ALIASES.get(word) {
            tokens.extend(split_phrase(phrase));
        } else if !is_droppable(word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

fn strip_leading(text: &str) -> &str {
    strip_leading_number_word(strip_leading_quantity(text))
}

/// Drops a leading "2", "1.5" or single vulgar fraction plus any whitespace after it.
fn strip_leading_quantity(text: &str) -> &str {
    let end = match text.chars().next() {
        Some(c) if VULGAR_FRACTIONS.contains(&c) => c.len_utf8(),
        Some(c) if c.is_ascii_digit() => {
            let digits = text
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(text.len());
            let rest = &text[digits..];
            match rest.strip_prefix('.') {
                Some(after_dot) if after_dot.starts_with(|c: char| c.is_ascii_digit()) => {
                    let fraction = after_dot
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(after_dot.len());
                    digits + 1 + fraction
                }
                _ => digits,
            }
        }
        _ => return text,
    };
    text[end..].trim_start()
}

/// Drops a leading spelled-out number, but only when whitespace follows it.
fn strip_leading_number_word(text: &str) -> &str {
    for word in LEADING_NUMBER_WORDS {
        if let Some(rest) = text.strip_prefix(word) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    text
}

fn split_phrase(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(str::to_string).collect()
}

fn is_droppable(word: &str) -> bool {
    FILLER_WORDS.contains(word)
        || UNIT_WORDS.contains(word)
        || is_quantity_token(word)
}

/// "2", "1.5", "1/2", "½" standing alone mid-phrase ("rice 2 cups").
fn is_quantity_token(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit() || VULGAR_FRACTIONS.contains(&c))
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '/' || VULGAR_FRACTIONS.contains(&c))
}
