//! Local lexical search: an ordered list of strategies over the local store,
//! then one retry on the last token alone.

use crate::errors::StoreError;
use crate::models::{to_food_candidate, FoodCandidate};
use crate::query_normalizer::NormalizedQuery;
use crate::search::store::{FoodStore, IndexLookup, MatchExpression, PatternTerm};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    IndexedPrefix,
    PatternMatch,
}

const STRATEGIES: [Strategy; 2] = [Strategy::IndexedPrefix, Strategy::PatternMatch];

/// What a strategy reports: either a page of results or a reason to move on.
#[derive(Debug)]
enum StrategyOutcome {
    Matched(Vec<FoodCandidate>),
    TryNext(String),
}

/// Runs local search for `query`, returning at most `limit` candidates after
/// skipping `offset`. Only store faults are errors; no match is `Ok(vec![])`.
pub fn search_local(
    store: &dyn FoodStore,
    query: &NormalizedQuery,
    offset: usize,
    limit: usize,
) -> Result<Vec<FoodCandidate>, StoreError> {
    if limit == 0 || query.is_empty() {
        return Ok(Vec::new());
    }

    let mut attempts = vec![query.clone()];
    attempts.extend(query.last_only());

    for attempt in &attempts {
        for strategy in STRATEGIES {
            match run_strategy(strategy, store, attempt.tokens(), offset, limit)? {
                StrategyOutcome::Matched(candidates) => {
                    debug!(query = %attempt, ?strategy, count = candidates.len(), "Local search matched");
                    return Ok(candidates);
                }
                StrategyOutcome::TryNext(reason) => {
                    debug!(query = %attempt, ?strategy, %reason, "Local strategy fell through");
                }
            }
        }
    }
    Ok(Vec::new())
}

fn run_strategy(
    strategy: Strategy,
    store: &dyn FoodStore,
    tokens: &[String],
    offset: usize,
    limit: usize,
) -> Result<StrategyOutcome, StoreError> {
    match strategy {
        Strategy::IndexedPrefix => indexed_prefix(store, tokens, offset, limit),
        Strategy::PatternMatch => pattern_match(store, tokens, offset, limit),
    }
}

fn indexed_prefix(
    store: &dyn FoodStore,
    tokens: &[String],
    offset: usize,
    limit: usize,
) -> Result<StrategyOutcome, StoreError> {
    let Some(expression) = MatchExpression::from_tokens(tokens) else {
        return Ok(StrategyOutcome::TryNext("no indexable terms".to_string()));
    };

    let mut hits = match store.match_prefix(&expression)? {
        IndexLookup::Hits(hits) => hits,
        IndexLookup::Unavailable(reason) => return Ok(StrategyOutcome::TryNext(reason)),
    };
    // Stable: relevance order survives within a category.
    hits.sort_by_key(|hit| hit.category.rank());

    let page_keys: Vec<String> = hits
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|hit| hit.key)
        .collect();
    if page_keys.is_empty() {
        return Ok(StrategyOutcome::TryNext(format!("index returned no rows for {expression}")));
    }

    let candidates: Vec<FoodCandidate> = store
        .get_many(&page_keys)?
        .iter()
        .map(to_food_candidate)
        .collect();
    if candidates.is_empty() {
        return Ok(StrategyOutcome::TryNext("indexed keys missing from store".to_string()));
    }
    Ok(StrategyOutcome::Matched(candidates))
}

fn pattern_match(
    store: &dyn FoodStore,
    tokens: &[String],
    offset: usize,
    limit: usize,
) -> Result<StrategyOutcome, StoreError> {
    let terms: Vec<PatternTerm> = tokens.iter().map(|t| PatternTerm::new(t)).collect();
    let Some(lead) = terms.first() else {
        return Ok(StrategyOutcome::TryNext("no terms".to_string()));
    };

    let mut rows = store.pattern_match(&terms)?;
    rows.sort_by_cached_key(|r| {
        (
            r.category.rank(),
            name_match_rank(lead, &r.name),
            r.name.to_lowercase(),
            r.food_id.clone(),
        )
    });

    let candidates: Vec<FoodCandidate> = rows
        .iter()
        .skip(offset)
        .take(limit)
        .map(to_food_candidate)
        .collect();
    if candidates.is_empty() {
        return Ok(StrategyOutcome::TryNext("no rows matched".to_string()));
    }
    Ok(StrategyOutcome::Matched(candidates))
}

/// How well a record name matches the lead term: 0 exact, 1 "word, ...",
/// 2 "word ...", 3 anything else.
fn name_match_rank(lead: &PatternTerm, name: &str) -> u8 {
    let name = name.trim().to_lowercase();
    let (word, stem) = (lead.word.as_str(), lead.stem.as_str());

    if name == word || name == stem {
        0
    } else if [format!("{word},"), format!("{stem},"), format!("{stem}s,")]
        .iter()
        .any(|p| name.starts_with(p.as_str()))
    {
        1
    } else if [format!("{word} "), format!("{stem} ")]
        .iter()
        .any(|p| name.starts_with(p.as_str()))
    {
        2
    } else {
        3
    }
}
