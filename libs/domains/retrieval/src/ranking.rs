//! Deterministic ordering of enriched candidates.
//!
//! Ranking is a pure function of the enriched batch and the per-call options:
//! a stable sort on an explicit (priority, -similarity, price) composite key.
//! Identical inputs always produce identical output order.

use std::cmp::Ordering;

use crate::models::{EnrichedItem, RetrievalOptions, SOURCE_ONLINE};

/// Items without a price sort after priced ones at equal priority/similarity
const MISSING_PRICE_SENTINEL: f64 = 1e12;

/// Sort items in place by the three-key ranking policy:
///
/// 1. priority: `0` when `prefer_online` is set and the item is
///    online-sourced, else `1`; constant (no effect) when `prefer_online`
///    is off
/// 2. similarity, descending
/// 3. price, ascending, missing prices last
pub fn rank(items: &mut [EnrichedItem], options: &RetrievalOptions) {
    items.sort_by(|a, b| compare(a, b, options));
}

fn compare(a: &EnrichedItem, b: &EnrichedItem, options: &RetrievalOptions) -> Ordering {
    priority(a, options)
        .cmp(&priority(b, options))
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| price_key(a).total_cmp(&price_key(b)))
}

fn priority(item: &EnrichedItem, options: &RetrievalOptions) -> u8 {
    if options.prefer_online && item.source.as_deref() == Some(SOURCE_ONLINE) {
        0
    } else {
        1
    }
}

fn price_key(item: &EnrichedItem) -> f64 {
    item.price.unwrap_or(MISSING_PRICE_SENTINEL)
}

/// Post-filter already-ranked results by color and maximum price.
///
/// Runs after ranking and before the final truncation, so filtering can
/// reduce the result count below `top_k` even when more matching candidates
/// exist in the catalog, because the index already limited candidates to the
/// `top_k` nearest neighbors. Items without a price are excluded whenever
/// `max_price` is present.
pub fn apply_filters(
    items: Vec<EnrichedItem>,
    filter_color: Option<&str>,
    max_price: Option<f64>,
) -> Vec<EnrichedItem> {
    items
        .into_iter()
        .filter(|item| match filter_color {
            Some(color) => item
                .color
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(color)),
            None => true,
        })
        .filter(|item| match max_price {
            Some(max) => item.price.is_some_and(|p| p <= max),
            None => true,
        })
        .collect()
}
