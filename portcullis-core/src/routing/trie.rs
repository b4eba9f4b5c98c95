//! Segment trie used to narrow the set of routes a path can match
//!
//! The trie only produces candidates; each candidate is verified against the
//! full route definition afterwards, so indexing may over-approximate but must
//! never miss a route that matches.

use std::collections::HashMap;

use super::pattern::{may_end_here, Segment};

#[derive(Debug, Default)]
struct TrieNode {
    static_children: HashMap<String, TrieNode>,
    param_child: Option<Box<TrieNode>>,
    wildcard_segment_child: Option<Box<TrieNode>>,
    catch_all_child: Option<Box<TrieNode>>,
    route_indices: Vec<usize>,
}

impl TrieNode {
    fn collect(&self, path: &[&str], depth: usize, out: &mut Vec<usize>) {
        if depth == path.len() {
            out.extend_from_slice(&self.route_indices);
            if let Some(catch_all) = &self.catch_all_child {
                out.extend_from_slice(&catch_all.route_indices);
            }
            return;
        }

        if let Some(child) = self.static_children.get(path[depth]) {
            child.collect(path, depth + 1, out);
        }
        if let Some(child) = &self.param_child {
            child.collect(path, depth + 1, out);
        }
        if let Some(child) = &self.wildcard_segment_child {
            child.collect(path, depth + 1, out);
        }
        if let Some(catch_all) = &self.catch_all_child {
            out.extend_from_slice(&catch_all.route_indices);
        }
    }
}

/// Prefix tree keyed by pattern segments, storing route registration indices
#[derive(Debug, Default)]
pub struct SegmentTrie {
    root: TrieNode,
}

impl SegmentTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a route under every node where a path matching it can end
    pub fn insert(&mut self, segments: &[Segment], route_index: usize) {
        let mut node = &mut self.root;
        let last = segments.len().saturating_sub(1);

        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Param { optional, .. } => {
                    if *optional && may_end_here(&segments[i..]) {
                        node.route_indices.push(route_index);
                    }
                    node = &mut **node.param_child.get_or_insert_with(Default::default);
                }
                Segment::Wildcard { catch_all: true, .. } => {
                    let child = node.catch_all_child.get_or_insert_with(Default::default);
                    child.route_indices.push(route_index);
                    return;
                }
                Segment::Wildcard { catch_all: false, .. } => {
                    node = &mut **node.wildcard_segment_child.get_or_insert_with(Default::default);
                }
                Segment::Static(value) => {
                    node = node.static_children.entry(value.clone()).or_default();
                }
            }

            if i == last {
                node.route_indices.push(route_index);
            }
        }
    }

    /// Route indices that may match `path_segments`, ascending and without duplicates
    pub fn candidates(&self, path_segments: &[&str]) -> Vec<usize> {
        let mut out = Vec::new();
        self.root.collect(path_segments, 0, &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::parse_pattern;

    fn trie_with(patterns: &[&str]) -> SegmentTrie {
        let mut trie = SegmentTrie::new();
        for (index, pattern) in patterns.iter().enumerate() {
            let (_, segments) = parse_pattern(pattern);
            trie.insert(&segments, index);
        }
        trie
    }

    #[test]
    fn static_and_param_candidates() {
        let trie = trie_with(&["/users", "/users/:id", "/users/me"]);
        assert_eq!(trie.candidates(&["users"]), vec![0]);
        assert_eq!(trie.candidates(&["users", "me"]), vec![1, 2]);
        assert_eq!(trie.candidates(&["users", "42"]), vec![1]);
        assert!(trie.candidates(&["posts"]).is_empty());
    }

    #[test]
    fn optional_param_is_indexed_at_parent() {
        let trie = trie_with(&["/page/:slug?"]);
        assert_eq!(trie.candidates(&["page"]), vec![0]);
        assert_eq!(trie.candidates(&["page", "about"]), vec![0]);
    }

    #[test]
    fn consecutive_optionals_reach_every_depth() {
        let trie = trie_with(&["/archive/:year?/:month?"]);
        assert_eq!(trie.candidates(&["archive"]), vec![0]);
        assert_eq!(trie.candidates(&["archive", "2024"]), vec![0]);
        assert_eq!(trie.candidates(&["archive", "2024", "05"]), vec![0]);
    }

    #[test]
    fn catch_all_collected_at_any_depth_below() {
        let trie = trie_with(&["/files/*path...", "/files/*name/raw"]);
        assert_eq!(trie.candidates(&["files"]), vec![0]);
        assert_eq!(trie.candidates(&["files", "a", "b", "c"]), vec![0]);
        assert_eq!(trie.candidates(&["files", "a", "raw"]), vec![0, 1]);
    }

    #[test]
    fn root_pattern() {
        let trie = trie_with(&["/"]);
        assert_eq!(trie.candidates(&[""]), vec![0]);
    }
}
