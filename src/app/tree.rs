//! Hierarchy browsing.
//!
//! The whole tree is fetched once; expansion is local state keyed by the
//! index path of each node, so collapsing and re-expanding never goes back
//! to the network and a collapsed parent keeps its descendants' state.

use crate::domain::model::HierarchyNode;
use std::collections::HashSet;

/// Index path from the top level down to a node, e.g. `[0, 2]`.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMarker {
    Collapsed,
    Expanded,
    Leaf,
}

impl NodeMarker {
    pub fn symbol(&self) -> char {
        match self {
            NodeMarker::Collapsed => '+',
            NodeMarker::Expanded => '−',
            NodeMarker::Leaf => '•',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow<'a> {
    pub path: NodePath,
    pub depth: usize,
    pub node: &'a HierarchyNode,
    pub marker: NodeMarker,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyBrowser {
    roots: Vec<HierarchyNode>,
    expanded: HashSet<NodePath>,
}

impl HierarchyBrowser {
    pub fn new(roots: Vec<HierarchyNode>) -> Self {
        Self {
            roots,
            expanded: HashSet::new(),
        }
    }

    pub fn roots(&self) -> &[HierarchyNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&HierarchyNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn is_expanded(&self, path: &[usize]) -> bool {
        self.expanded.contains(path)
    }

    /// Flips one node. Returns the new state, or `None` if the path is unknown.
    pub fn toggle(&mut self, path: &[usize]) -> Option<bool> {
        self.node_at(path)?;
        if self.expanded.remove(path) {
            Some(false)
        } else {
            self.expanded.insert(path.to_vec());
            Some(true)
        }
    }

    pub fn expand_all(&mut self) {
        fn walk(nodes: &[HierarchyNode], prefix: &mut NodePath, out: &mut HashSet<NodePath>) {
            for (i, node) in nodes.iter().enumerate() {
                prefix.push(i);
                if node.has_children() {
                    out.insert(prefix.clone());
                    walk(&node.children, prefix, out);
                }
                prefix.pop();
            }
        }
        let mut prefix = Vec::new();
        walk(&self.roots, &mut prefix, &mut self.expanded);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Depth-first search for a node by its tariff code.
    pub fn find_by_code(&self, code: &str) -> Option<NodePath> {
        fn walk(nodes: &[HierarchyNode], code: &str, prefix: &mut NodePath) -> Option<NodePath> {
            for (i, node) in nodes.iter().enumerate() {
                prefix.push(i);
                if node.code.as_deref() == Some(code) {
                    return Some(prefix.clone());
                }
                if let Some(found) = walk(&node.children, code, prefix) {
                    return Some(found);
                }
                prefix.pop();
            }
            None
        }
        walk(&self.roots, code, &mut Vec::new())
    }

    /// Expands every ancestor of `path` so the node itself becomes visible.
    pub fn reveal(&mut self, path: &[usize]) {
        for len in 1..path.len() {
            self.expanded.insert(path[..len].to_vec());
        }
    }

    /// Rows in display order; children of collapsed nodes are skipped.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        fn collect<'a>(
            nodes: &'a [HierarchyNode],
            depth: usize,
            prefix: &mut NodePath,
            expanded: &HashSet<NodePath>,
            result: &mut Vec<TreeRow<'a>>,
        ) {
            for (i, node) in nodes.iter().enumerate() {
                prefix.push(i);
                let open = expanded.contains(prefix.as_slice());
                let marker = match (node.has_children(), open) {
                    (false, _) => NodeMarker::Leaf,
                    (true, true) => NodeMarker::Expanded,
                    (true, false) => NodeMarker::Collapsed,
                };
                result.push(TreeRow {
                    path: prefix.clone(),
                    depth,
                    node,
                    marker,
                });
                if open && node.has_children() {
                    collect(&node.children, depth + 1, prefix, expanded, result);
                }
                prefix.pop();
            }
        }

        let mut result = Vec::new();
        collect(&self.roots, 0, &mut Vec::new(), &self.expanded, &mut result);
        result
    }

    /// Path of the n-th visible row, counting from 1 as the rendering does.
    pub fn path_of_row(&self, row: usize) -> Option<NodePath> {
        row.checked_sub(1)
            .and_then(|i| self.visible_rows().into_iter().nth(i))
            .map(|r| r.path)
    }

    pub fn render(&self) -> String {
        self.visible_rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "{:>3}  {}{} {}",
                    i + 1,
                    "  ".repeat(row.depth),
                    row.marker.symbol(),
                    row.node.display_label()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<HierarchyNode> {
        vec![
            HierarchyNode::new("Chapter 84", Some("84")).with_children(vec![
                HierarchyNode::new("Computers", Some("8471")).with_children(vec![
                    HierarchyNode::new("Laptops", Some("8471.30")),
                ]),
                HierarchyNode::new("Printers", Some("8443")),
            ]),
            HierarchyNode::new("Chapter 85", Some("85")).with_children(vec![
                HierarchyNode::new("Phones", Some("8517")),
            ]),
            HierarchyNode::new("Misc", None),
        ]
    }

    fn labels(browser: &HierarchyBrowser) -> Vec<String> {
        browser
            .visible_rows()
            .iter()
            .map(|r| r.node.label.clone())
            .collect()
    }

    #[test]
    fn test_initial_render_shows_collapsed_top_level() {
        let browser = HierarchyBrowser::new(sample_tree());
        let rows = browser.visible_rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.depth == 0));
        assert_eq!(rows[0].marker, NodeMarker::Collapsed);
        assert_eq!(rows[2].marker, NodeMarker::Leaf);
    }

    #[test]
    fn test_toggle_shows_only_direct_children() {
        let mut browser = HierarchyBrowser::new(sample_tree());
        assert_eq!(browser.toggle(&[0]), Some(true));

        assert_eq!(
            labels(&browser),
            vec!["Chapter 84", "Computers", "Printers", "Chapter 85", "Misc"]
        );
        assert!(!browser.is_expanded(&[1]));

        assert_eq!(browser.toggle(&[0]), Some(false));
        assert_eq!(labels(&browser), vec!["Chapter 84", "Chapter 85", "Misc"]);
    }

    #[test]
    fn test_collapse_keeps_descendant_state() {
        let mut browser = HierarchyBrowser::new(sample_tree());
        browser.toggle(&[0]);
        browser.toggle(&[0, 0]);
        browser.toggle(&[0]);
        browser.toggle(&[0]);

        assert_eq!(
            labels(&browser),
            vec!["Chapter 84", "Computers", "Laptops", "Printers", "Chapter 85", "Misc"]
        );
    }

    #[test]
    fn test_toggle_unknown_path() {
        let mut browser = HierarchyBrowser::new(sample_tree());
        assert_eq!(browser.toggle(&[7]), None);
        assert_eq!(browser.toggle(&[]), None);
    }

    #[test]
    fn test_find_and_reveal() {
        let mut browser = HierarchyBrowser::new(sample_tree());
        let path = browser.find_by_code("8471.30").unwrap();
        assert_eq!(path, vec![0, 0, 0]);

        browser.reveal(&path);
        assert!(labels(&browser).contains(&"Laptops".to_string()));
        assert_eq!(browser.find_by_code("9999"), None);
    }

    #[test]
    fn test_expand_all_and_render() {
        let mut browser = HierarchyBrowser::new(sample_tree());
        browser.expand_all();
        assert_eq!(browser.visible_rows().len(), 7);
        assert_eq!(browser.path_of_row(3), Some(vec![0, 0, 0]));

        let rendered = browser.render();
        assert!(rendered.contains("− Chapter 84 (84)"));
        assert!(rendered.contains("    • Laptops (8471.30)"));

        browser.collapse_all();
        assert_eq!(browser.visible_rows().len(), 3);
    }
}
