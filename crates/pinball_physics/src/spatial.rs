//! Bounding volume hierarchy used for both broad-phase indices
//!
//! The tree is stored as a flat node array. Building sorts items by the
//! centroid of their box along the longest axis of the centroid bounds and
//! splits at the median, which keeps the tree balanced in O(n log n).
//! Queries return every item whose box overlaps the query box; false
//! positives are filtered by the narrow phase.

use std::cmp::Ordering;

use crate::bounds::Aabb;

/// Maximum number of items stored in a leaf
const LEAF_SIZE: usize = 4;

#[derive(Clone, Debug)]
enum Node {
    Leaf { bounds: Aabb, start: usize, count: usize },
    Branch { bounds: Aabb, left: usize, right: usize },
}

impl Node {
    fn bounds(&self) -> &Aabb {
        match self {
            Node::Leaf { bounds, .. } | Node::Branch { bounds, .. } => bounds,
        }
    }
}

/// Bounding volume hierarchy over copyable item handles
#[derive(Clone, Debug)]
pub struct Bvh<T: Copy> {
    nodes: Vec<Node>,
    items: Vec<(Aabb, T)>,
    stack: Vec<usize>,
}

impl<T: Copy> Default for Bvh<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            items: Vec::new(),
            stack: Vec::new(),
        }
    }
}

impl<T: Copy> Bvh<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(bounds, item)` pairs
    pub fn build(items: impl IntoIterator<Item = (Aabb, T)>) -> Self {
        let mut bvh = Self::new();
        bvh.rebuild(items);
        bvh
    }

    /// Replace the indexed set, reusing allocations
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (Aabb, T)>) {
        self.nodes.clear();
        self.items.clear();
        self.items.extend(items);
        if !self.items.is_empty() {
            self.build_range(0, self.items.len());
        }
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of tree nodes (diagnostics)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append every item whose box overlaps `bounds` to `out`
    pub fn query(&mut self, bounds: &Aabb, out: &mut Vec<T>) {
        if self.nodes.is_empty() {
            return;
        }

        self.stack.clear();
        self.stack.push(0);
        while let Some(index) = self.stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds().overlaps(bounds) {
                continue;
            }
            match *node {
                Node::Leaf { start, count, .. } => {
                    out.extend(
                        self.items[start..start + count]
                            .iter()
                            .filter(|(item_bounds, _)| item_bounds.overlaps(bounds))
                            .map(|&(_, item)| item),
                    );
                }
                Node::Branch { left, right, .. } => {
                    // Right first so the left subtree is visited first
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }

    /// Build the subtree over `items[start..end]` and return its node index
    fn build_range(&mut self, start: usize, end: usize) -> usize {
        let slice = &mut self.items[start..end];
        let bounds = slice.iter().fold(Aabb::EMPTY, |acc, (b, _)| acc.union(b));

        if slice.len() <= LEAF_SIZE {
            self.nodes.push(Node::Leaf {
                bounds,
                start,
                count: end - start,
            });
            return self.nodes.len() - 1;
        }

        let centroid_bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, (b, _)| acc.union(&Aabb::new(b.center(), b.center())));
        let axis = centroid_bounds.longest_axis();
        let mid = slice.len() / 2;
        slice.select_nth_unstable_by(mid, |(a, _), (b, _)| {
            a.center()
                .axis(axis)
                .partial_cmp(&b.center().axis(axis))
                .unwrap_or(Ordering::Equal)
        });

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            bounds,
            start,
            count: 0,
        });
        let left = self.build_range(start, start + mid);
        let right = self.build_range(start + mid, end);
        self.nodes[index] = Node::Branch { bounds, left, right };
        index
    }
}
