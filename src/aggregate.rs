//! Aggregation strategies, one per chart.
//!
//! Every function is total over the record slice and deterministic. Grouping
//! keeps discovery order explicitly (a key list beside the lookup map) rather
//! than leaning on the iteration order of a hash container.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::data::{AgeCategory, Record};
use crate::ir::{CategoryCount, FlowEdge, FlowGraph, FlowNamespace, HeatCell, HeatmapData};

/// Counts every genre occurrence, in discovery order.
pub fn category_totals(records: &[Record]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for genre in &record.genres {
            match index.get(genre.as_str()) {
                Some(&idx) => counts[idx].value += 1,
                None => {
                    index.insert(genre.as_str(), counts.len());
                    counts.push(CategoryCount {
                        category: genre.clone(),
                        value: 1,
                    });
                }
            }
        }
    }
    counts
}

/// The `k` most frequent genres, descending. Ties keep discovery order.
pub fn top_categories(records: &[Record], k: usize) -> Vec<CategoryCount> {
    let mut counts = category_totals(records);
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts.truncate(k);
    counts
}

#[derive(Debug, Default)]
struct RatingSum {
    sum: f64,
    count: u32,
}

pub fn grouped_average(records: &[Record], max_categories: usize) -> HeatmapData {
    let mut keys: Vec<(&str, AgeCategory)> = Vec::new();
    let mut sums: HashMap<(&str, AgeCategory), RatingSum> = HashMap::new();

    for record in records {
        let (Some(age), Some(rating)) = (record.age_category, record.rating_average) else {
            continue;
        };
        for genre in &record.genres {
            let key = (genre.as_str(), age);
            let entry = sums.entry(key).or_insert_with(|| {
                keys.push(key);
                RatingSum::default()
            });
            entry.sum += rating;
            entry.count += 1;
        }
    }

    let all_cells: Vec<HeatCell> = keys
        .iter()
        .map(|key| {
            let acc = &sums[key];
            HeatCell {
                genre: key.0.to_string(),
                age: key.1,
                value: acc.sum / f64::from(acc.count),
            }
        })
        .collect();

    let rating_extent = all_cells.iter().fold(None, |extent, cell| match extent {
        None => Some((cell.value, cell.value)),
        Some((lo, hi)) => Some((f64::min(lo, cell.value), f64::max(hi, cell.value))),
    });

    let mut genre_order: Vec<&str> = Vec::new();
    let mut ages_seen: HashMap<&str, HashSet<AgeCategory>> = HashMap::new();
    for cell in &all_cells {
        let seen = ages_seen.entry(cell.genre.as_str()).or_insert_with(|| {
            genre_order.push(cell.genre.as_str());
            HashSet::new()
        });
        seen.insert(cell.age);
    }

    // First N complete genres in discovery order, not the N best by any rank.
    let categories: Vec<String> = genre_order
        .iter()
        .filter(|genre| ages_seen[*genre].len() == AgeCategory::ALL.len())
        .take(max_categories)
        .map(|genre| genre.to_string())
        .collect();

    let cells: Vec<HeatCell> = all_cells
        .iter()
        .filter(|cell| categories.contains(&cell.genre))
        .cloned()
        .collect();

    debug!(
        groups = all_cells.len(),
        displayed = categories.len(),
        "grouped ratings by genre and age"
    );

    HeatmapData {
        cells,
        all_cells,
        categories,
        rating_extent,
    }
}

#[derive(Default)]
struct EdgeCounter {
    keys: Vec<(String, String)>,
    weights: HashMap<(String, String), u64>,
}

impl EdgeCounter {
    fn add(&mut self, source: String, target: String) {
        let key = (source, target);
        match self.weights.get_mut(&key) {
            Some(weight) => *weight += 1,
            None => {
                self.keys.push(key.clone());
                self.weights.insert(key, 1);
            }
        }
    }

    fn into_edges(mut self) -> impl Iterator<Item = FlowEdge> {
        let weights = std::mem::take(&mut self.weights);
        self.keys.into_iter().map(move |key| FlowEdge {
            weight: weights[&key],
            source: key.0,
            target: key.1,
        })
    }
}

/// Genre -> age -> adaptation flow over the `k` most frequent genres.
///
/// Genre->age weights count each (record, allowed genre) pair. Age->adapted
/// weights count each record once, provided it reached the diagram through at
/// least one allowed genre.
pub fn flow_graph(records: &[Record], k: usize) -> FlowGraph {
    let allowed: HashSet<String> = top_categories(records, k)
        .into_iter()
        .map(|count| count.category)
        .collect();

    let mut genre_to_age = EdgeCounter::default();
    let mut age_to_adapted = EdgeCounter::default();

    for record in records {
        let (Some(age), Some(adapted)) = (record.age_category, record.adapted_to_movie) else {
            continue;
        };
        let age_id = FlowNamespace::Age.node_id(age.label());
        let mut contributed = false;
        for genre in record.genres.iter().filter(|genre| allowed.contains(*genre)) {
            genre_to_age.add(FlowNamespace::Genre.node_id(genre), age_id.clone());
            contributed = true;
        }
        if contributed {
            let outcome = if adapted { "True" } else { "False" };
            age_to_adapted.add(age_id, FlowNamespace::Adapted.node_id(outcome));
        }
    }

    let edges = genre_to_age
        .into_edges()
        .chain(age_to_adapted.into_edges())
        .collect();
    FlowGraph::from_edges(edges)
}
