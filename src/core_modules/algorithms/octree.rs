// THEORY:
// Octree quantization buckets colors by their bits. Each level of the tree consumes
// one bit from each 8-bit channel (most significant first), so a node at depth d
// represents a cube of color space 2^(8-d) units wide and has up to eight
// children, one per (r, g, b) bit triplet. Leaves accumulate a pixel count and
// channel sums; a leaf's color is their average.
//
// Key architectural principles:
// 1.  **Arena Ownership**: Nodes live in a single `Vec` and refer to their children
//     by index. A node owns its children exclusively; there are no back-pointers and
//     no shared references, so collapsing a subtree is just index bookkeeping.
//     Freed slots are recycled.
// 2.  **Bounded Leaves**: After every insertion, while the tree holds more than
//     `max_leaves` leaves, one internal node is collapsed into a leaf. The leaf
//     bound is an invariant between insertions, so memory never grows with the
//     number of distinct colors.
// 3.  **Greedy Reduction**: The node collapsed is taken from the deepest level that
//     has any candidates (the finest distinctions go first) and, within that level,
//     is the one that has seen the fewest pixels (the least informative). A per-depth
//     index of reducible nodes makes finding it a lookup, not a tree walk.
//     Internal nodes count every pixel routed through them on insertion, so this
//     comparison sees real subtree sizes rather than falling back to insertion order.
//
// The result is frequency-biased: large uniform regions keep their own leaves,
// rare colors get folded into their neighbors.

use super::PaletteAlgorithm;
use crate::config::ProcessingOptions;
use crate::core_modules::color::color::RgbColor;

/// Bits per channel, and therefore the depth at which nodes become leaves.
pub const MAX_DEPTH: usize = 8;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<RgbColor> for Rgb8 {
    fn from(color: RgbColor) -> Self {
        let [r, g, b] = color.to_bytes();
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Default)]
struct OctreeNode {
    is_leaf: bool,
    /// Pixels inserted through this node (or into it, for a leaf).
    pixel_count: u64,
    red_sum: u64,
    green_sum: u64,
    blue_sum: u64,
    children: [Option<NodeId>; 8],
}

impl OctreeNode {
    fn average(&self) -> Rgb8 {
        if self.pixel_count == 0 {
            return Rgb8 { r: 0, g: 0, b: 0 };
        }
        Rgb8 {
            r: (self.red_sum / self.pixel_count) as u8,
            g: (self.green_sum / self.pixel_count) as u8,
            b: (self.blue_sum / self.pixel_count) as u8,
        }
    }
}

/// Child slot for `color` at `depth`: bit (7 - depth) of r, g, b as a 3-bit index.
pub fn child_index(color: Rgb8, depth: usize) -> usize {
    let shift = 7 - depth;
    let r = ((color.r >> shift) & 1) as usize;
    let g = ((color.g >> shift) & 1) as usize;
    let b = ((color.b >> shift) & 1) as usize;
    (r << 2) | (g << 1) | b
}

/// A color octree that never holds more than `max_leaves` leaves.
#[derive(Debug, Clone)]
pub struct Octree {
    max_leaves: usize,
    nodes: Vec<OctreeNode>,
    free: Vec<NodeId>,
    root: NodeId,
    leaf_count: usize,
    /// Internal nodes with at least one child, grouped by depth.
    reducible: [Vec<NodeId>; MAX_DEPTH],
}

impl Octree {
    /// `max_leaves` is raised to 1; a tree always has room for one leaf.
    pub fn new(max_leaves: usize) -> Self {
        Self {
            max_leaves: max_leaves.max(1),
            nodes: vec![OctreeNode::default()],
            free: Vec::new(),
            root: 0,
            leaf_count: 0,
            reducible: Default::default(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn max_leaves(&self) -> usize {
        self.max_leaves
    }

    pub fn insert(&mut self, color: Rgb8) {
        let mut node = self.root;
        let mut depth = 0;

        loop {
            self.nodes[node].pixel_count += 1;
            if self.nodes[node].is_leaf {
                let leaf = &mut self.nodes[node];
                leaf.red_sum += color.r as u64;
                leaf.green_sum += color.g as u64;
                leaf.blue_sum += color.b as u64;
                break;
            }

            let slot = child_index(color, depth);
            node = match self.nodes[node].children[slot] {
                Some(child) => child,
                None => self.spawn_child(node, slot, depth),
            };
            depth += 1;
        }

        while self.leaf_count > self.max_leaves {
            match self.next_reducible() {
                Some((depth, position)) => self.reduce(depth, position),
                None => break,
            }
        }
    }

    fn spawn_child(&mut self, parent: NodeId, slot: usize, parent_depth: usize) -> NodeId {
        if self.nodes[parent].children.iter().all(Option::is_none) {
            self.reducible[parent_depth].push(parent);
        }

        let is_leaf = parent_depth + 1 == MAX_DEPTH;
        if is_leaf {
            self.leaf_count += 1;
        }
        let node = OctreeNode {
            is_leaf,
            ..OctreeNode::default()
        };
        let child = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.nodes[parent].children[slot] = Some(child);
        child
    }

    /// Deepest level with candidates; within it, the node with the fewest pixels.
    fn next_reducible(&self) -> Option<(usize, usize)> {
        let depth = (0..MAX_DEPTH).rev().find(|&d| !self.reducible[d].is_empty())?;
        let mut best = 0;
        for (position, &id) in self.reducible[depth].iter().enumerate().skip(1) {
            if self.nodes[id].pixel_count < self.nodes[self.reducible[depth][best]].pixel_count {
                best = position;
            }
        }
        Some((depth, best))
    }

    /// Folds every child of the chosen node into it and turns it into a leaf.
    fn reduce(&mut self, depth: usize, position: usize) {
        let id = self.reducible[depth].remove(position);
        let children = std::mem::take(&mut self.nodes[id].children);

        let mut merged = 0;
        let (mut count, mut red, mut green, mut blue) = (0, 0, 0, 0);
        for child in children.into_iter().flatten() {
            self.release(child, depth + 1);
            let child = &self.nodes[child];
            count += child.pixel_count;
            red += child.red_sum;
            green += child.green_sum;
            blue += child.blue_sum;
            merged += 1;
        }

        let node = &mut self.nodes[id];
        node.is_leaf = true;
        node.pixel_count = count;
        node.red_sum = red;
        node.green_sum = green;
        node.blue_sum = blue;
        self.leaf_count = self.leaf_count + 1 - merged;
    }

    /// Returns a collapsed child's slot to the free list.
    ///
    /// Children of the deepest reducible level are always leaves: an internal child
    /// would itself be reducible one level deeper.
    fn release(&mut self, child: NodeId, child_depth: usize) {
        debug_assert!(self.nodes[child].is_leaf, "child at depth {child_depth} is not a leaf");
        self.free.push(child);
    }

    /// Leaves as (color, pixel count), most frequent first; ties keep traversal order.
    pub fn leaves(&self) -> Vec<(Rgb8, u64)> {
        let mut leaves = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf {
                leaves.push((node.average(), node.pixel_count));
            } else {
                stack.extend(node.children.iter().rev().flatten());
            }
        }
        leaves.sort_by(|a, b| b.1.cmp(&a.1));
        leaves
    }

    /// Up to `max_leaves` leaf colors, most frequent first.
    pub fn palette(&self) -> Vec<Rgb8> {
        self.leaves()
            .into_iter()
            .take(self.max_leaves)
            .map(|(color, _)| color)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OctreeAlgorithm;

impl PaletteAlgorithm for OctreeAlgorithm {
    fn name(&self) -> &'static str {
        "Octree Quantization"
    }

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        _options: &ProcessingOptions,
    ) -> Vec<RgbColor> {
        if samples.is_empty() || max_colors == 0 {
            return Vec::new();
        }

        let mut octree = Octree::new(max_colors);
        for sample in samples {
            octree.insert(Rgb8::from(*sample));
        }

        octree
            .palette()
            .into_iter()
            .map(|c| RgbColor::from_bytes(c.r, c.g, c.b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb8 {
        Rgb8 { r, g, b }
    }

    #[test]
    fn child_index_takes_msb_first() {
        let color = rgb(0b1000_0000, 0b0000_0000, 0b1000_0001);
        assert_eq!(child_index(color, 0), 0b101);
        assert_eq!(child_index(color, 7), 0b001);
        assert_eq!(child_index(rgb(255, 255, 255), 3), 0b111);
    }

    #[test]
    fn distinct_colors_get_distinct_leaves() {
        let mut octree = Octree::new(8);
        octree.insert(rgb(255, 0, 0));
        octree.insert(rgb(0, 0, 255));
        octree.insert(rgb(255, 0, 0));
        assert_eq!(octree.leaf_count(), 2);
        assert_eq!(octree.leaves(), vec![(rgb(255, 0, 0), 2), (rgb(0, 0, 255), 1)]);
    }

    #[test]
    fn repeated_color_does_not_add_leaves() {
        let mut octree = Octree::new(1);
        for _ in 0..100 {
            octree.insert(rgb(12, 34, 56));
        }
        assert_eq!(octree.leaf_count(), 1);
        assert_eq!(octree.palette(), vec![rgb(12, 34, 56)]);
    }

    #[test]
    fn reduction_merges_siblings_at_the_deepest_level() {
        let mut octree = Octree::new(1);
        octree.insert(rgb(100, 100, 100));
        octree.insert(rgb(101, 100, 100));
        // The two colors differ only in the last bit, so their depth-7 parent collapses.
        assert_eq!(octree.leaf_count(), 1);
        assert_eq!(octree.leaves(), vec![(rgb(100, 100, 100), 2)]);
    }

    #[test]
    fn reduction_prefers_the_node_with_fewest_pixels() {
        let mut octree = Octree::new(3);
        for _ in 0..5 {
            octree.insert(rgb(0, 0, 0));
            octree.insert(rgb(0, 0, 1));
        }
        octree.insert(rgb(255, 255, 254));
        // Leaves: (0,0,0), (0,0,1), (255,255,254). Adding a sibling of the rare white
        // leaf forces a reduction; its parent has 2 pixels against 10 and goes first.
        octree.insert(rgb(255, 255, 255));
        assert_eq!(octree.leaf_count(), 3);
        let leaves = octree.leaves();
        assert_eq!(leaves[0], (rgb(0, 0, 0), 5));
        assert_eq!(leaves[1], (rgb(0, 0, 1), 5));
        assert_eq!(leaves[2], (rgb(255, 255, 254), 2));
    }

    #[test]
    fn leaf_count_never_exceeds_bound() {
        for max_leaves in [1, 2, 3, 4, 8, 16] {
            let mut octree = Octree::new(max_leaves);
            let mut state = 0x2545_f491_u32;
            for _ in 0..3_000 {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, _] = state.to_le_bytes();
                octree.insert(rgb(r, g, b));
                assert!(octree.leaf_count() <= max_leaves);
                assert_eq!(octree.leaves().len(), octree.leaf_count());
            }
        }
    }

    #[test]
    fn palette_is_frequency_ordered_and_truncated() {
        let mut samples = vec![RgbColor::BLUE; 3];
        samples.extend(vec![RgbColor::RED; 5]);
        samples.push(RgbColor::GREEN);
        let colors = OctreeAlgorithm.extract_colors(&samples, 3, &ProcessingOptions::default());
        assert_eq!(colors, vec![RgbColor::RED, RgbColor::BLUE, RgbColor::GREEN]);
    }

    #[test]
    fn zero_colors_requested() {
        let options = ProcessingOptions::default();
        let colors = OctreeAlgorithm.extract_colors(&[RgbColor::RED], 0, &options);
        assert!(colors.is_empty());
    }
}
