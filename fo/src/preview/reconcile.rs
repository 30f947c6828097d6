//! Before/after reconciliation of a parsed preview tree

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::PreviewNode;

/// Entry kind in a flattened listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a flattened before/after listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub name: String,
    pub path: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// The two flattened views derived from one preview tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciled {
    /// The directory as it currently is
    pub before: Vec<FlatEntry>,
    /// The directory as it will be once the plan is applied
    pub after: Vec<FlatEntry>,
}

/// Flatten a preview tree into before and after entry lists
///
/// The before list is the tree's current structure, irrespective of pending
/// moves. The after list relocates each moved file to its destination and
/// synthesizes destination directories that did not already exist, each
/// emitted before the files reconciled into it.
pub fn reconcile(tree: &PreviewNode) -> Reconciled {
    let mut before = Vec::new();
    // Keyed by full source path, so same-named files in different
    // directories cannot capture each other's destination
    let mut moves: HashMap<String, String> = HashMap::new();

    if let PreviewNode::Directory(children) = tree {
        walk(children, "", &mut before, &mut moves);
    }

    let mut known_dirs: BTreeSet<String> = before
        .iter()
        .filter(|entry| entry.kind == EntryKind::Directory)
        .map(|entry| entry.path.clone())
        .collect();

    let mut after = Vec::with_capacity(before.len());
    for entry in &before {
        match entry.kind {
            EntryKind::Directory => after.push(entry.clone()),
            EntryKind::File => match moves.get(&entry.path) {
                Some(destination) => {
                    let components = split_destination(destination);
                    synthesize_ancestors(&components, &mut known_dirs, &mut after);
                    after.push(FlatEntry {
                        name: entry.name.clone(),
                        path: join_path(&components, &entry.name),
                        kind: EntryKind::File,
                    });
                }
                None => after.push(entry.clone()),
            },
        }
    }

    debug!(
        before = before.len(),
        after = after.len(),
        moves = moves.len(),
        "reconcile: flattened preview tree"
    );
    Reconciled { before, after }
}

/// Depth-first traversal collecting entries and move records
fn walk(
    children: &std::collections::BTreeMap<String, PreviewNode>,
    prefix: &str,
    entries: &mut Vec<FlatEntry>,
    moves: &mut HashMap<String, String>,
) {
    for (name, node) in children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        match node {
            PreviewNode::Directory(grandchildren) => {
                entries.push(FlatEntry {
                    name: name.clone(),
                    path: path.clone(),
                    kind: EntryKind::Directory,
                });
                walk(grandchildren, &path, entries, moves);
            }
            PreviewNode::File => {
                entries.push(FlatEntry {
                    name: name.clone(),
                    path,
                    kind: EntryKind::File,
                });
            }
            PreviewNode::Moved(destination) => {
                entries.push(FlatEntry {
                    name: name.clone(),
                    path: path.clone(),
                    kind: EntryKind::File,
                });
                moves.insert(path, destination.clone());
            }
        }
    }
}

/// Decompose a destination directory string into its components
///
/// The backend emits both separator conventions, so split on either.
fn split_destination(destination: &str) -> Vec<&str> {
    destination
        .split(['/', '\\'])
        .filter(|component| !component.is_empty())
        .collect()
}

/// Emit directory entries for every destination ancestor not yet known
fn synthesize_ancestors(components: &[&str], known_dirs: &mut BTreeSet<String>, after: &mut Vec<FlatEntry>) {
    let mut path = String::new();
    for component in components {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(component);

        if known_dirs.insert(path.clone()) {
            after.push(FlatEntry {
                name: (*component).to_string(),
                path: path.clone(),
                kind: EntryKind::Directory,
            });
        }
    }
}

fn join_path(components: &[&str], name: &str) -> String {
    if components.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", components.join("/"), name)
    }
}
