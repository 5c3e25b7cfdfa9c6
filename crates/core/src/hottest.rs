//! Component I: hottest-frames index.
//!
//! A derived, read-only projection over the call tree: every non-root
//! node ordered by `(self_value desc, value desc)`, with a width
//! allocation over `[0, 1]` used to render a "hottest frames" strip.
//! Selections made here drive the same camera transition as a flame
//! graph click — see [`crate::interaction::Interaction::set_selected_frame`].

use flamepprof_protocol::SharedStr;

use crate::tree::CallTree;

const ZERO_SHARE_EPSILON: f64 = 0.002;
const ZERO_SHARE_CAP: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct HottestEntry {
    pub node_index: usize,
    pub id: SharedStr,
    pub name: SharedStr,
    pub self_value: f64,
    pub value: f64,
    pub width: f64,
    pub x: f64,
}

/// Builds the ordered, width-allocated hottest-frames projection.
pub fn hottest_index(tree: &CallTree) -> Vec<HottestEntry> {
    let mut indices: Vec<usize> = (1..tree.nodes.len()).collect();
    indices.sort_by(|&a, &b| {
        let na = &tree.nodes[a];
        let nb = &tree.nodes[b];
        nb.self_value
            .total_cmp(&na.self_value)
            .then_with(|| nb.value.total_cmp(&na.value))
    });

    let positive_sum: f64 = indices
        .iter()
        .map(|&i| tree.nodes[i].self_value)
        .filter(|&v| v > 0.0)
        .sum();
    let zero_count = indices.iter().filter(|&&i| tree.nodes[i].self_value <= 0.0).count();

    let zero_share = (ZERO_SHARE_EPSILON * zero_count as f64).min(ZERO_SHARE_CAP);
    let positive_share = 1.0 - zero_share;
    let per_zero_width = if zero_count > 0 { zero_share / zero_count as f64 } else { 0.0 };

    let mut entries = Vec::with_capacity(indices.len());
    let mut cursor = 0.0;
    for idx in indices {
        let node = &tree.nodes[idx];
        let width = if node.self_value > 0.0 && positive_sum > 0.0 {
            (node.self_value / positive_sum) * positive_share
        } else {
            per_zero_width
        };
        entries.push(HottestEntry {
            node_index: idx,
            id: node.id.clone(),
            name: node.name.clone(),
            self_value: node.self_value,
            value: node.value,
            width,
            x: cursor,
        });
        cursor += width;
    }
    entries
}

/// Cursor navigation over a hottest-frames projection: `first`/`prev`/
/// `next`/`last` each return the id of the node that should become
/// selected.
pub struct HottestCursor {
    position: Option<usize>,
}

impl HottestCursor {
    pub fn new() -> Self {
        Self { position: None }
    }

    pub fn first(&mut self, entries: &[HottestEntry]) -> Option<SharedStr> {
        if entries.is_empty() {
            return None;
        }
        self.position = Some(0);
        Some(entries[0].id.clone())
    }

    pub fn last(&mut self, entries: &[HottestEntry]) -> Option<SharedStr> {
        if entries.is_empty() {
            return None;
        }
        let idx = entries.len() - 1;
        self.position = Some(idx);
        Some(entries[idx].id.clone())
    }

    pub fn next(&mut self, entries: &[HottestEntry]) -> Option<SharedStr> {
        if entries.is_empty() {
            return None;
        }
        let idx = match self.position {
            Some(p) if p + 1 < entries.len() => p + 1,
            Some(p) => p,
            None => 0,
        };
        self.position = Some(idx);
        Some(entries[idx].id.clone())
    }

    pub fn prev(&mut self, entries: &[HottestEntry]) -> Option<SharedStr> {
        if entries.is_empty() {
            return None;
        }
        let idx = match self.position {
            Some(p) if p > 0 => p - 1,
            Some(p) => p,
            None => 0,
        };
        self.position = Some(idx);
        Some(entries[idx].id.clone())
    }

    /// Selects the node whose cumulative-width span contains `u` (a
    /// strip click at normalized position `u` in `[0, 1]`).
    pub fn select_at_width(&mut self, entries: &[HottestEntry], u: f64) -> Option<SharedStr> {
        for (idx, entry) in entries.iter().enumerate() {
            if u >= entry.x && u < entry.x + entry.width {
                self.position = Some(idx);
                return Some(entry.id.clone());
            }
        }
        None
    }
}

impl Default for HottestCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ProfileKind, ProfileMetadata};
    use crate::decode::{Function, Line, Location, Profile, Sample, SampleType, StringTable};
    use crate::tree::build_tree;

    fn sample_tree() -> CallTree {
        let strings = vec!["", "A", "B", "C", "main.rs"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let functions = vec![
            Function { id: 1, name_idx: 1, filename_idx: 4, start_line: 0 },
            Function { id: 2, name_idx: 2, filename_idx: 4, start_line: 0 },
            Function { id: 3, name_idx: 3, filename_idx: 4, start_line: 0 },
        ];
        let locations = vec![
            Location { id: 1, lines: vec![Line { function_id: 1, line: 1 }] },
            Location { id: 2, lines: vec![Line { function_id: 2, line: 1 }] },
            Location { id: 3, lines: vec![Line { function_id: 3, line: 1 }] },
        ];
        let samples = vec![
            Sample { location_ids: vec![2, 1], values: vec![3] },
            Sample { location_ids: vec![3, 1], values: vec![1] },
        ];
        let profile = Profile {
            string_table: StringTable(strings),
            sample_types: vec![SampleType { type_idx: 0, unit_idx: 0 }],
            samples,
            locations,
            functions,
            time_nanos: 0,
            duration_nanos: 0,
            period: 0,
        };
        let metadata = ProfileMetadata { kind: ProfileKind::Unknown, value_column: 0, scale: 1.0 };
        build_tree(&profile, &metadata, None)
    }

    #[test]
    fn ordering_is_self_value_desc_then_value_desc_h1() {
        let tree = sample_tree();
        let entries = hottest_index(&tree);
        // A has self_value 0, B has 3, C has 1: order should be B, C, A.
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_ref()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn widths_sum_to_one_h2() {
        let tree = sample_tree();
        let entries = hottest_index(&tree);
        let total: f64 = entries.iter().map(|e| e.width).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn strip_click_matches_arrow_navigation_h3() {
        let tree = sample_tree();
        let entries = hottest_index(&tree);
        let mut cursor = HottestCursor::new();
        let first = cursor.first(&entries).unwrap();

        let mut cursor2 = HottestCursor::new();
        let at_zero = cursor2.select_at_width(&entries, 0.0).unwrap();
        assert_eq!(first, at_zero);
    }

    #[test]
    fn cursor_next_prev_first_last() {
        let tree = sample_tree();
        let entries = hottest_index(&tree);
        let mut cursor = HottestCursor::new();
        let first = cursor.first(&entries).unwrap();
        let next = cursor.next(&entries).unwrap();
        assert_ne!(first, next);
        let prev = cursor.prev(&entries).unwrap();
        assert_eq!(prev, first);
        let last = cursor.last(&entries).unwrap();
        assert_eq!(last, entries.last().unwrap().id);
    }
}
