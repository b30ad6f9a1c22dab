//! Pseudo-edges inferred from word alignment.
//!
//! Fallback edge source for the line-based detector when a page draws
//! no ruling lines: rows of words whose tops coincide imply horizontal
//! edges, and columns of words sharing a left, right, or centre x
//! position imply vertical edges.

use crate::geometry::Rect;
use crate::layout::text_block::EnrichedWord;
use crate::tables::Edge;
use crate::utils::safe_float_cmp;

/// Alignment tolerance when clustering word positions, in points.
const CLUSTER_TOLERANCE: f64 = 1.0;

/// Derive horizontal pseudo-edges from words with aligned tops.
///
/// Each cluster of at least `min_words` words sharing a top coordinate
/// emits two edges, at the cluster's top and bottom, spanning the joint
/// x-range of all clusters.
pub fn words_to_edges_horizontal(words: &[EnrichedWord], min_words: usize) -> Vec<Edge> {
    if words.is_empty() {
        return Vec::new();
    }

    let clusters = cluster_by(words, |w| w.bbox.y0);
    let large: Vec<&PositionCluster> = clusters
        .iter()
        .filter(|c| c.members.len() >= min_words)
        .collect();
    if large.is_empty() {
        return Vec::new();
    }

    let mut min_x0 = f64::INFINITY;
    let mut max_x1 = f64::NEG_INFINITY;
    for cluster in &large {
        for w in &cluster.members {
            min_x0 = min_x0.min(w.bbox.x0);
            max_x1 = max_x1.max(w.bbox.x1);
        }
    }

    let mut edges = Vec::with_capacity(large.len() * 2);
    for cluster in &large {
        let top = cluster.position;
        let bottom = cluster
            .members
            .iter()
            .map(|w| w.bbox.y1)
            .fold(top, f64::max);

        edges.push(Edge::horizontal(min_x0, max_x1, top));
        edges.push(Edge::horizontal(min_x0, max_x1, bottom));
    }

    edges
}

/// Derive vertical pseudo-edges from words with aligned x positions.
///
/// Words are clustered by left edge, right edge, and centre; the
/// largest non-overlapping clusters of at least `min_words` words each
/// emit one edge at their left boundary, plus a single edge at the
/// rightmost extent.
pub fn words_to_edges_vertical(words: &[EnrichedWord], min_words: usize) -> Vec<Edge> {
    if words.is_empty() {
        return Vec::new();
    }

    let mut clusters = cluster_by(words, |w| w.bbox.x0);
    clusters.extend(cluster_by(words, |w| w.bbox.x1));
    clusters.extend(cluster_by(words, |w| w.bbox.center_x()));

    // Largest clusters take precedence when claiming page regions.
    clusters.sort_by(|a, b| b.members.len().cmp(&a.members.len()));

    let large: Vec<&PositionCluster> = clusters
        .iter()
        .filter(|c| c.members.len() >= min_words)
        .collect();
    if large.is_empty() {
        return Vec::new();
    }

    // Keep only clusters whose bounding boxes do not overlap an already
    // kept one; overlapping clusters describe the same column of words
    // seen from a different anchor.
    let mut kept: Vec<Rect> = Vec::new();
    for cluster in &large {
        let bbox = cluster.bbox();
        if !kept.iter().any(|existing| existing.overlaps(&bbox)) {
            kept.push(bbox);
        }
    }
    if kept.is_empty() {
        return Vec::new();
    }

    kept.sort_by(|a, b| safe_float_cmp(&a.x0, &b.x0));

    let min_top = kept.iter().map(|b| b.y0).fold(f64::INFINITY, f64::min);
    let max_bottom = kept.iter().map(|b| b.y1).fold(f64::NEG_INFINITY, f64::max);
    let max_x1 = kept.iter().map(|b| b.x1).fold(f64::NEG_INFINITY, f64::max);

    let mut edges: Vec<Edge> = kept
        .iter()
        .map(|b| Edge::vertical(b.x0, min_top, max_bottom))
        .collect();
    edges.push(Edge::vertical(max_x1, min_top, max_bottom));

    edges
}

struct PositionCluster {
    position: f64,
    members: Vec<EnrichedWord>,
}

impl PositionCluster {
    fn bbox(&self) -> Rect {
        self.members
            .iter()
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

/// Cluster words by a position key within [`CLUSTER_TOLERANCE`].
fn cluster_by<F: Fn(&EnrichedWord) -> f64>(words: &[EnrichedWord], key: F) -> Vec<PositionCluster> {
    let mut clusters: Vec<PositionCluster> = Vec::new();

    for word in words {
        let value = key(word);
        match clusters
            .iter_mut()
            .find(|c| (c.position - value).abs() < CLUSTER_TOLERANCE)
        {
            Some(cluster) => cluster.members.push(word.clone()),
            None => clusters.push(PositionCluster {
                position: value,
                members: vec![word.clone()],
            }),
        }
    }

    clusters
}
