//! Component D: layout engine.
//!
//! Positions are tree-relative and normalized to `[0, 1]`; the renderer
//! maps them into device pixels through the camera. Vertical position is
//! `depth × frame_height`, computed by the renderer at draw time, not
//! stored here.

use super::{CallTree, FlameNode};
use flamepprof_protocol::SharedStr;

/// One node's layout-ready record, produced by a pre-order traversal.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub node_index: usize,
    pub id: SharedStr,
    pub name: SharedStr,
    pub depth: u32,
    pub x: f64,
    pub width: f64,
    pub value: f64,
    pub self_value: f64,
}

/// Sorts each node's children by descending value and assigns `x`/`width`
/// as a fraction of the parent's own span. Idempotent: re-running only
/// re-derives the same floats.
pub fn layout_tree(tree: &mut CallTree) {
    tree.nodes[0].x = 0.0;
    tree.nodes[0].width = 1.0;
    layout_children(tree, 0);
}

fn layout_children(tree: &mut CallTree, parent: usize) {
    tree.nodes[parent]
        .children
        .sort_by(|&a, &b| tree.nodes[b].value.total_cmp(&tree.nodes[a].value));

    let parent_value = tree.nodes[parent].value;
    let parent_x = tree.nodes[parent].x;
    let parent_width = tree.nodes[parent].width;

    let mut cursor = parent_x;
    let children = tree.nodes[parent].children.clone();
    for child in children {
        let share = if parent_value > 0.0 {
            tree.nodes[child].value / parent_value
        } else {
            0.0
        };
        let width = share * parent_width;
        tree.nodes[child].x = cursor;
        tree.nodes[child].width = width;
        cursor += width;
        layout_children(tree, child);
    }
}

/// Pre-order traversal producing one [`FrameRecord`] per node.
pub fn generate_frames(tree: &CallTree) -> Vec<FrameRecord> {
    let mut out = Vec::with_capacity(tree.nodes.len());
    let mut stack = vec![0usize];
    while let Some(idx) = stack.pop() {
        let node: &FlameNode = &tree.nodes[idx];
        out.push(FrameRecord {
            node_index: idx,
            id: node.id.clone(),
            name: node.name.clone(),
            depth: node.depth,
            x: node.x,
            width: node.width,
            value: node.value,
            self_value: node.self_value,
        });
        for &child in node.children.iter().rev() {
            stack.push(child);
        }
    }
    out
}

pub fn max_depth(tree: &CallTree) -> u32 {
    tree.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
}

pub fn graph_height(tree: &CallTree, frame_height: f64) -> f64 {
    (max_depth(tree) as f64 + 1.0) * frame_height
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
    fn max_depth_and_graph_height() {
        let tree = sample_tree();
        assert_eq!(max_depth(&tree), 2);
        assert_eq!(graph_height(&tree, 21.0), 63.0);
    }

    #[test]
    fn generate_frames_is_preorder_and_covers_every_node() {
        let tree = sample_tree();
        let frames = generate_frames(&tree);
        assert_eq!(frames.len(), tree.nodes.len());
        assert_eq!(frames[0].name.as_ref(), "root");
        assert_eq!(frames[1].name.as_ref(), "A");
    }

    #[test]
    fn layout_is_idempotent() {
        let mut tree = sample_tree();
        let before: Vec<(f64, f64)> = tree.nodes.iter().map(|n| (n.x, n.width)).collect();
        layout_tree(&mut tree);
        let after: Vec<(f64, f64)> = tree.nodes.iter().map(|n| (n.x, n.width)).collect();
        assert_eq!(before, after);
    }
}
