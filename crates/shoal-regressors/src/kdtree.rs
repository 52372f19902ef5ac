//! Insertion-only k-d tree over feature vectors.
//!
//! Every node stores one point, its observed value, and the size and
//! bounding box of its whole subtree. The box is grown on the way down
//! during insertion, so a query can prune a subtree with
//! [`WeightedMetric::distance_to_rect`] as soon as the box is farther
//! than the current k-th best candidate.
//!
//! Points are never deleted. Depth stays logarithmic by partial rebuilds:
//! when a new leaf lands deeper than `log_{1/α}(n)`, the highest ancestor
//! on its path whose heavier child holds more than `α` of its subtree is
//! rebuilt around median splits. A stream sorted on one feature (time,
//! usually) therefore never degrades into a chain.
//!
//! Nodes live in a flat `Vec` in insertion order and refer to their
//! children by index. A rebuild only rewires links, so a node's index is
//! also its insertion sequence.

use shoal_core::FeatureVector;
use shoal_regression::WeightedMetric;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Weight-balance factor `α` for partial rebuilds.
const BALANCE: f64 = 0.7;

#[derive(Clone, Debug)]
struct Node {
    point: FeatureVector,
    value: f64,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
    size: usize,
    min: FeatureVector,
    max: FeatureVector,
}

impl Node {
    fn grow(&mut self, point: &[f64]) {
        for (i, &x) in point.iter().enumerate() {
            self.min[i] = self.min[i].min(x);
            self.max[i] = self.max[i].max(x);
        }
    }
}

/// A candidate neighbor on the search heap. The heap is a max-heap on
/// distance, so its top is the worst of the current k best. Equal
/// distances keep the earlier-inserted point.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// One result of a nearest-neighbor query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Insertion index of the point.
    pub index: usize,
    /// Distance under the query metric.
    pub distance: f64,
    /// Value stored with the point.
    pub value: f64,
}

/// The tree itself.
#[derive(Clone, Debug)]
pub struct KdTree {
    dim: usize,
    nodes: Vec<Node>,
    root: Option<usize>,
    rebuilds: usize,
}

impl KdTree {
    /// An empty tree for points with `dim` coordinates.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            nodes: Vec::new(),
            root: None,
            rebuilds: 0,
        }
    }

    /// Point dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no point has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest leaf (0 for an empty tree).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: Option<usize>) -> usize {
            match at {
                None => 0,
                Some(i) => 1 + walk(nodes, nodes[i].left).max(walk(nodes, nodes[i].right)),
            }
        }
        walk(&self.nodes, self.root)
    }

    /// How many subtrees have been rebuilt so far.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Insert a point with its value.
    ///
    /// # Panics
    ///
    /// Panics if `point.len() != self.dim()`.
    pub fn insert(&mut self, point: &[f64], value: f64) {
        assert_eq!(point.len(), self.dim, "point dimensionality");
        let index = self.nodes.len();
        let mut axis = 0;
        let mut path = Vec::new();

        if let Some(mut at) = self.root {
            loop {
                path.push(at);
                let node = &mut self.nodes[at];
                node.grow(point);
                node.size += 1;
                let go_left = point[node.axis] < node.point[node.axis];
                let child = if go_left { node.left } else { node.right };
                match child {
                    Some(next) => at = next,
                    None => {
                        if go_left {
                            node.left = Some(index);
                        } else {
                            node.right = Some(index);
                        }
                        axis = (node.axis + 1) % self.dim.max(1);
                        break;
                    }
                }
            }
        } else {
            self.root = Some(index);
        }

        let point: FeatureVector = point.iter().copied().collect();
        self.nodes.push(Node {
            min: point.clone(),
            max: point.clone(),
            point,
            value,
            axis,
            left: None,
            right: None,
            size: 1,
        });

        if path.len() > self.depth_limit() {
            self.rebuild_scapegoat(&path);
        }
    }

    /// `floor(log_{1/α}(n))`: the deepest a new leaf may land.
    fn depth_limit(&self) -> usize {
        let n = self.nodes.len() as f64;
        (n.ln() / (1.0 / BALANCE).ln()).floor() as usize
    }

    /// Rebuild the highest ancestor on `path` (root first, ending at the
    /// new leaf's parent) whose child on the path is too heavy.
    fn rebuild_scapegoat(&mut self, path: &[usize]) {
        let mut child_size = 1;
        for (pos, &at) in path.iter().enumerate().rev() {
            let size = self.nodes[at].size;
            if child_size as f64 > BALANCE * size as f64 {
                let parent = pos.checked_sub(1).map(|p| path[p]);
                self.rebuild(at, parent);
                return;
            }
            child_size = size;
        }
    }

    fn rebuild(&mut self, at: usize, parent: Option<usize>) {
        let mut members = Vec::with_capacity(self.nodes[at].size);
        let mut pending = vec![at];
        while let Some(i) = pending.pop() {
            members.push(i);
            pending.extend(self.nodes[i].left);
            pending.extend(self.nodes[i].right);
        }
        let size = members.len();
        let top = self.build(&mut members);
        match parent {
            None => self.root = top,
            Some(p) => {
                let node = &mut self.nodes[p];
                if node.left == Some(at) {
                    node.left = top;
                } else {
                    node.right = top;
                }
            }
        }
        self.rebuilds += 1;
        tracing::trace!(size, rebuilds = self.rebuilds, "k-d subtree rebuilt");
    }

    /// Link `ids` into a median-split subtree and return its root.
    fn build(&mut self, ids: &mut [usize]) -> Option<usize> {
        if ids.is_empty() {
            return None;
        }
        let size = ids.len();
        let axis = self.widest_axis(ids);
        ids.sort_unstable_by(|&a, &b| {
            self.nodes[a].point[axis]
                .total_cmp(&self.nodes[b].point[axis])
                .then(a.cmp(&b))
        });
        let mid = size / 2;
        let at = ids[mid];
        let (lower, upper) = ids.split_at_mut(mid);
        let left = self.build(lower);
        let right = self.build(&mut upper[1..]);

        let mut min = self.nodes[at].point.clone();
        let mut max = min.clone();
        for child in [left, right].into_iter().flatten() {
            let c = &self.nodes[child];
            for d in 0..self.dim {
                min[d] = min[d].min(c.min[d]);
                max[d] = max[d].max(c.max[d]);
            }
        }
        let node = &mut self.nodes[at];
        node.axis = axis;
        node.left = left;
        node.right = right;
        node.size = size;
        node.min = min;
        node.max = max;
        Some(at)
    }

    /// The dimension along which `ids` spread the most; lowest wins ties.
    fn widest_axis(&self, ids: &[usize]) -> usize {
        (0..self.dim)
            .map(|d| {
                let (lo, hi) = ids.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    let x = self.nodes[i].point[d];
                    (lo.min(x), hi.max(x))
                });
                (d, hi - lo)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map_or(0, |(d, _)| d)
    }

    /// The `k` points nearest to `query` under `metric`, closest first.
    ///
    /// Returns fewer than `k` results only if the tree holds fewer
    /// points; any `k` is accepted.
    pub fn nearest(&self, query: &[f64], k: usize, metric: &WeightedMetric) -> Vec<Neighbor> {
        let k = k.min(self.nodes.len());
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(root, query, k, metric, &mut heap);
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.distance,
                value: self.nodes[c.index].value,
            })
            .collect()
    }

    fn search(
        &self,
        at: usize,
        query: &[f64],
        k: usize,
        metric: &WeightedMetric,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[at];
        if heap.len() == k {
            let bound = metric.distance_to_rect(query, &node.min, &node.max);
            if let Some(worst) = heap.peek() {
                if bound > worst.distance {
                    return;
                }
            }
        }

        let candidate = Candidate {
            distance: metric.distance(query, &node.point),
            index: at,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        // Descend into the side containing the query first.
        let (near, far) = if query[node.axis] < node.point[node.axis] {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(child) = near {
            self.search(child, query, k, metric, heap);
        }
        if let Some(child) = far {
            self.search(child, query, k, metric, heap);
        }
    }
}
