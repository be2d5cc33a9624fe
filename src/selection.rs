//! Per-file inclusion/exclusion selection tree.
//!
//! Mirrors the archive's path hierarchy; a UI layer renders it as a checkbox
//! tree and hands it back to the pipeline, which reads only file-level
//! `checked` flags. An unchecked file is stored verbatim and never recorded
//! in a manifest. Folder flags are advisory: toggling one propagates to all
//! descendants, but encryption decisions are made per file.

use std::collections::BTreeMap;

/// File names excluded from encryption by default — the game engine needs to
/// read them in plaintext.
pub const DEFAULT_EXCLUDED: [&str; 3] = ["manifest.json", "pack_icon.png", "bug_pack_icon.png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

#[derive(Debug, Clone)]
pub struct SelectionNode {
    pub name: String,
    /// Full archive path of this node ("" for the synthetic root).
    pub path: String,
    pub kind: NodeKind,
    pub checked: bool,
    /// Children keyed by segment name; no two children share a name.
    pub children: BTreeMap<String, SelectionNode>,
}

impl SelectionNode {
    fn new(name: &str, path: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            checked: true,
            children: BTreeMap::new(),
        }
    }

    fn set_checked_recursive(&mut self, checked: bool) {
        self.checked = checked;
        for child in self.children.values_mut() {
            child.set_checked_recursive(checked);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionTree {
    root: SelectionNode,
}

impl SelectionTree {
    /// Build a tree from archive file paths, everything checked.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut root = SelectionNode::new("", "", NodeKind::Folder);
        for path in paths {
            let path = path.as_ref().replace('\\', "/");
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                continue;
            }
            let mut node = &mut root;
            let mut prefix = String::new();
            for (i, segment) in segments.iter().enumerate() {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);
                let kind = if i == segments.len() - 1 {
                    NodeKind::File
                } else {
                    NodeKind::Folder
                };
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| SelectionNode::new(segment, &prefix, kind));
            }
        }
        Self { root }
    }

    /// Build a tree with the default exclusions already applied: any file
    /// literally named `manifest.json`, `pack_icon.png` or `bug_pack_icon.png`
    /// starts unchecked, wherever it sits in the hierarchy.
    pub fn with_default_exclusions<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut tree = Self::from_paths(paths);
        fn apply(node: &mut SelectionNode) {
            if node.kind == NodeKind::File && DEFAULT_EXCLUDED.contains(&node.name.as_str()) {
                node.checked = false;
            }
            for child in node.children.values_mut() {
                apply(child);
            }
        }
        apply(&mut tree.root);
        tree
    }

    pub fn root(&self) -> &SelectionNode {
        &self.root
    }

    pub fn find(&self, path: &str) -> Option<&SelectionNode> {
        let path = path.replace('\\', "/");
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Toggle a node; folder toggles propagate to every descendant.
    /// Returns false if the path is not in the tree.
    pub fn set_checked(&mut self, path: &str, checked: bool) -> bool {
        let path = path.replace('\\', "/");
        let mut node = &mut self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = match node.children.get_mut(segment) {
                Some(n) => n,
                None => return false,
            };
        }
        node.set_checked_recursive(checked);
        true
    }

    /// Whether the pipeline should encrypt this file. Paths absent from the
    /// tree default to included.
    pub fn is_included(&self, path: &str) -> bool {
        self.find(path).map(|n| n.checked).unwrap_or(true)
    }
}
