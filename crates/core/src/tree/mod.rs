//! Component C: call-tree builder.
//!
//! The tree is a single arena (`Vec<FlameNode>`) keyed by index, not a
//! graph of `Rc`-linked nodes — a node's `parent` is `Option<usize>`,
//! its `children` a `Vec<usize>`. This keeps stack-trace folding and
//! child iteration O(depth)/O(fanout) with no retain cycle.

pub mod layout;

use std::collections::HashMap;

use flamepprof_protocol::SharedStr;

use crate::classify::ProfileMetadata;
use crate::decode::Profile;

#[derive(Debug, Clone)]
pub struct FlameNode {
    pub id: SharedStr,
    pub name: SharedStr,
    pub filename: SharedStr,
    pub depth: u32,
    pub value: f64,
    pub self_value: f64,
    pub sample_count: u64,
    pub x: f64,
    pub width: f64,
    pub self_width: f64,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl FlameNode {
    fn new(id: SharedStr, name: SharedStr, filename: SharedStr, depth: u32, parent: Option<usize>) -> Self {
        Self {
            id,
            name,
            filename,
            depth,
            value: 0.0,
            self_value: 0.0,
            sample_count: 0,
            x: 0.0,
            width: if parent.is_none() { 1.0 } else { 0.0 },
            self_width: 0.0,
            parent,
            children: Vec::new(),
        }
    }
}

/// Arena-backed call tree. Index 0 is always the root.
#[derive(Debug, Clone, Default)]
pub struct CallTree {
    pub nodes: Vec<FlameNode>,
}

impl CallTree {
    pub fn root(&self) -> &FlameNode {
        &self.nodes[0]
    }

    pub fn get(&self, idx: usize) -> Option<&FlameNode> {
        self.nodes.get(idx)
    }
}

/// A resolved location: the (name, filename, line) of its first `Line`
/// entry, with synthetic fallbacks for unresolved ids (§7 ReferenceError
/// policy — the builder never fails on a dangling reference).
struct ResolvedLocation {
    name: SharedStr,
    filename: SharedStr,
}

fn resolve_locations(profile: &Profile) -> HashMap<u64, ResolvedLocation> {
    let mut functions = HashMap::new();
    for f in &profile.functions {
        functions.insert(f.id, f);
    }

    let mut out = HashMap::with_capacity(profile.locations.len());
    for loc in &profile.locations {
        let resolved = match loc.lines.first() {
            Some(line) => match functions.get(&line.function_id) {
                Some(func) => ResolvedLocation {
                    name: SharedStr::from(profile.string(func.name_idx)),
                    filename: SharedStr::from(profile.string(func.filename_idx)),
                },
                None => ResolvedLocation {
                    name: SharedStr::from(format!("func_{}", line.function_id)),
                    filename: SharedStr::from(""),
                },
            },
            None => ResolvedLocation {
                name: SharedStr::from(format!("loc_{}", loc.id)),
                filename: SharedStr::from(""),
            },
        };
        out.insert(loc.id, resolved);
    }
    out
}

/// Predicate deciding whether a resolved filename belongs to "library"
/// code that should collapse into its parent under an app-only filter.
/// Parameterized rather than hard-coded so a caller can target a
/// different ecosystem's convention; [`default_app_only_filter`] targets
/// the Rust toolchain/crates.io layout.
pub type FilterPredicate = dyn Fn(&str) -> bool;

pub fn default_app_only_filter(filename: &str) -> bool {
    filename.contains("/.cargo/registry/") || filename.contains("/rustc/")
}

/// Builds the call tree by folding every sample's (reversed) location
/// sequence root-to-leaf into the arena, then optionally collapsing
/// frames matched by `filter` (when `Some`) and laying out widths.
pub fn build_tree(
    profile: &Profile,
    metadata: &ProfileMetadata,
    filter: Option<&FilterPredicate>,
) -> CallTree {
    let resolved = resolve_locations(profile);

    let mut nodes = vec![FlameNode::new(
        SharedStr::from("root"),
        SharedStr::from("root"),
        SharedStr::from(""),
        0,
        None,
    )];

    for sample in &profile.samples {
        if sample.location_ids.is_empty() {
            continue;
        }
        let value = *sample.values.get(metadata.value_column).unwrap_or(&0) as f64 * metadata.scale;

        // Wire format is leaf-to-root; the tree is built root-to-leaf.
        // An id absent from `resolved` (a location id on the sample that
        // wasn't in the profile's location table) falls back to a
        // synthetic name rather than erroring (§7 ReferenceError policy).
        let owned: Vec<(SharedStr, SharedStr)> = sample
            .location_ids
            .iter()
            .rev()
            .map(|id| match resolved.get(id) {
                Some(r) => (r.name.clone(), r.filename.clone()),
                None => (SharedStr::from(format!("loc_{id}")), SharedStr::from("")),
            })
            .collect();

        let mut cursor = 0usize;
        nodes[0].value += value;
        nodes[0].sample_count += 1;
        for (name, filename) in &owned {
            let child_idx = nodes[cursor]
                .children
                .iter()
                .copied()
                .find(|&c| &nodes[c].name == name);
            let idx = match child_idx {
                Some(idx) => idx,
                None => {
                    let depth = nodes[cursor].depth + 1;
                    let id = SharedStr::from(format!("{}/{}", nodes[cursor].id, name));
                    let new_idx = nodes.len();
                    nodes.push(FlameNode::new(id, name.clone(), filename.clone(), depth, Some(cursor)));
                    nodes[cursor].children.push(new_idx);
                    new_idx
                }
            };
            nodes[idx].value += value;
            nodes[idx].sample_count += 1;
            cursor = idx;
        }
    }

    let mut tree = CallTree { nodes };
    if let Some(filter) = filter {
        apply_app_only_filter(&mut tree, filter);
    }
    compute_self_values(&mut tree);
    layout::layout_tree(&mut tree);
    tree
}

/// Collapses frames matched by `filter` into their parent: the node's
/// `value` is absorbed by the parent's existing value (already counted,
/// since value is additive along the stack) and its children reparent
/// to its own parent, preserving their relative `value`/`sample_count`.
fn apply_app_only_filter(tree: &mut CallTree, filter: &FilterPredicate) {
    // Never collapse the root.
    let mut to_remove = Vec::new();
    for idx in 1..tree.nodes.len() {
        if filter(&tree.nodes[idx].filename) {
            to_remove.push(idx);
        }
    }
    if to_remove.is_empty() {
        return;
    }

    for &idx in &to_remove {
        let parent = tree.nodes[idx].parent;
        let children = std::mem::take(&mut tree.nodes[idx].children);
        for &child in &children {
            tree.nodes[child].parent = parent;
        }
        if let Some(parent) = parent {
            tree.nodes[parent].children.retain(|&c| c != idx);
            tree.nodes[parent].children.extend(children);
        }
    }

    // Rebuild the arena without the removed indices, remapping all
    // parent/children references.
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut new_nodes = Vec::with_capacity(tree.nodes.len() - to_remove.len());
    for (old_idx, node) in tree.nodes.iter().enumerate() {
        if to_remove.contains(&old_idx) {
            continue;
        }
        remap.insert(old_idx, new_nodes.len());
        new_nodes.push(node.clone());
    }
    for node in &mut new_nodes {
        node.parent = node.parent.and_then(|p| remap.get(&p).copied());
        node.children = node
            .children
            .iter()
            .filter_map(|c| remap.get(c).copied())
            .collect();
    }
    // Fix up depths, since removed nodes could shorten a branch.
    fix_depths(&mut new_nodes);
    tree.nodes = new_nodes;
}

fn fix_depths(nodes: &mut [FlameNode]) {
    nodes[0].depth = 0;
    let mut stack = vec![0usize];
    while let Some(idx) = stack.pop() {
        let depth = nodes[idx].depth;
        let children = nodes[idx].children.clone();
        for child in children {
            nodes[child].depth = depth + 1;
            stack.push(child);
        }
    }
}

/// `self_value = max(0, value − Σ children.value)`, computed bottom-up.
/// `self_width` is derived once the root's total value is known; if the
/// root has zero value, `self_width` is 0 everywhere.
fn compute_self_values(tree: &mut CallTree) {
    let order: Vec<usize> = post_order(tree);
    for idx in order {
        let children_value: f64 = tree.nodes[idx].children.iter().map(|&c| tree.nodes[c].value).sum();
        tree.nodes[idx].self_value = (tree.nodes[idx].value - children_value).max(0.0);
    }
    let root_value = tree.nodes[0].value;
    for node in &mut tree.nodes {
        node.self_width = if root_value > 0.0 {
            node.self_value / root_value
        } else {
            0.0
        };
    }
}

fn post_order(tree: &CallTree) -> Vec<usize> {
    let mut order = Vec::with_capacity(tree.nodes.len());
    let mut stack = vec![(0usize, false)];
    while let Some((idx, visited)) = stack.pop() {
        if visited {
            order.push(idx);
        } else {
            stack.push((idx, true));
            for &child in &tree.nodes[idx].children {
                stack.push((child, false));
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ProfileKind;
    use crate::decode::{Function, Line, Location, Profile, Sample, SampleType, StringTable};

    fn sample_profile() -> Profile {
        // strings: 0="" 1="A" 2="B" 3="C" 4="main.rs"
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
        // stack [A, B] value 3 -> location_ids leaf-to-root = [B, A] = [2, 1]
        // stack [A, C] value 1 -> location_ids leaf-to-root = [C, A] = [3, 1]
        let samples = vec![
            Sample { location_ids: vec![2, 1], values: vec![3] },
            Sample { location_ids: vec![3, 1], values: vec![1] },
        ];
        Profile {
            string_table: StringTable(strings),
            sample_types: vec![SampleType { type_idx: 0, unit_idx: 0 }],
            samples,
            locations,
            functions,
            time_nanos: 0,
            duration_nanos: 0,
            period: 0,
        }
    }

    fn metadata() -> ProfileMetadata {
        ProfileMetadata { kind: ProfileKind::Unknown, value_column: 0, scale: 1.0 }
    }

    #[test]
    fn builds_tree_matching_scenario_1() {
        let profile = sample_profile();
        let tree = build_tree(&profile, &metadata(), None);

        assert_eq!(tree.root().value, 4.0);
        assert_eq!(tree.root().self_value, 0.0);

        let a_idx = tree.root().children[0];
        let a = &tree.nodes[a_idx];
        assert_eq!(a.name.as_ref(), "A");
        assert_eq!(a.value, 4.0);
        assert_eq!(a.self_value, 0.0);
        assert_eq!(a.width, 1.0);
        assert_eq!(a.x, 0.0);

        assert_eq!(a.children.len(), 2);
        let b = &tree.nodes[a.children[0]];
        let c = &tree.nodes[a.children[1]];
        assert_eq!(b.name.as_ref(), "B");
        assert_eq!(b.value, 3.0);
        assert_eq!(b.self_value, 3.0);
        assert_eq!((b.width - 0.75).abs() < 1e-9, true);
        assert_eq!(b.x, 0.0);

        assert_eq!(c.name.as_ref(), "C");
        assert_eq!(c.value, 1.0);
        assert_eq!(c.self_value, 1.0);
        assert_eq!((c.width - 0.25).abs() < 1e-9, true);
        assert_eq!((c.x - 0.75).abs() < 1e-9, true);
    }

    #[test]
    fn empty_sequence_sample_is_discarded() {
        let mut profile = sample_profile();
        profile.samples.push(Sample { location_ids: vec![], values: vec![99] });
        let tree = build_tree(&profile, &metadata(), None);
        assert_eq!(tree.root().value, 4.0);
    }

    #[test]
    fn missing_value_defaults_to_zero() {
        let mut profile = sample_profile();
        profile.samples.push(Sample { location_ids: vec![2, 1], values: vec![] });
        let tree = build_tree(&profile, &metadata(), None);
        // No change: the extra sample contributes 0.
        assert_eq!(tree.root().value, 4.0);
    }

    #[test]
    fn app_only_filter_collapses_library_frames_scenario_5() {
        let strings = vec!["", "A", "N", "X", "Y", "lib.rs", "/node_modules/pkg/index.js"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let functions = vec![
            Function { id: 1, name_idx: 1, filename_idx: 5, start_line: 0 },
            Function { id: 2, name_idx: 2, filename_idx: 6, start_line: 0 },
            Function { id: 3, name_idx: 3, filename_idx: 5, start_line: 0 },
            Function { id: 4, name_idx: 4, filename_idx: 5, start_line: 0 },
        ];
        let locations = vec![
            Location { id: 1, lines: vec![Line { function_id: 1, line: 1 }] },
            Location { id: 2, lines: vec![Line { function_id: 2, line: 1 }] },
            Location { id: 3, lines: vec![Line { function_id: 3, line: 1 }] },
            Location { id: 4, lines: vec![Line { function_id: 4, line: 1 }] },
        ];
        // stack [A, N, X] value 2, stack [A, N, Y] value 1
        let samples = vec![
            Sample { location_ids: vec![3, 2, 1], values: vec![2] },
            Sample { location_ids: vec![4, 2, 1], values: vec![1] },
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

        let filter: &FilterPredicate = &|filename: &str| filename.contains("/node_modules/");
        let tree = build_tree(&profile, &metadata(), Some(filter));

        let a_idx = tree.root().children[0];
        let a = &tree.nodes[a_idx];
        assert_eq!(a.name.as_ref(), "A");
        // N has disappeared; X and Y are now direct children of A.
        assert_eq!(a.children.len(), 2);
        let names: Vec<&str> = a.children.iter().map(|&i| tree.nodes[i].name.as_ref()).collect();
        assert!(names.contains(&"X"));
        assert!(names.contains(&"Y"));
        assert!(!names.contains(&"N"));
        assert_eq!(a.value, 3.0);
    }

    #[test]
    fn default_filter_targets_cargo_registry_and_rustc() {
        assert!(default_app_only_filter("/root/.cargo/registry/src/foo-1.0/lib.rs"));
        assert!(default_app_only_filter("/rustc/abcdef/library/core/src/lib.rs"));
        assert!(!default_app_only_filter("/home/user/project/src/main.rs"));
    }
}
