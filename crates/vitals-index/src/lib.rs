//! OrderedIndex: order-statistic red-black tree
//!
//! A keyed multimap of signed 64-bit keys to opaque payloads, with
//! logarithmic insert, remove, bound queries, rank queries and find-by-rank.
//! It backs the sample stores in `vitals-stats` and `vitals-metrics`, where
//! keys are elapsed-nanosecond offsets and payloads are sample handles.
//!
//! ## Design
//!
//! 1. **Arena + sentinel**: nodes live in a `Vec`, linked by index. Slot 0
//!    is a shared sentinel standing in for every external position, so the
//!    rebalancing code never branches on "no child". The arena owns all
//!    nodes; no node owns another, so there are no ownership cycles.
//! 2. **Size augmentation**: every node stores the size of its subtree.
//!    Sizes are refreshed bottom-up along the affected spine on every
//!    structural change, stopping early once a recomputed size matches.
//! 3. **Multimap ties**: duplicate keys are permitted. An equal key inserts
//!    into the right subtree, so among ties the most recently inserted node
//!    has the highest rank.
//! 4. **Free list**: removed cells are cached for reuse, which keeps the
//!    arena from growing under a steady insert/remove churn.
//!
//! ## Bound semantics
//!
//! [`OrderedIndex::lower_bound`] returns the lowest-ranked node with key
//! `>= k`. [`OrderedIndex::upper_bound`] returns the highest-ranked node
//! with key **strictly less than** `k` — the predecessor of the lower
//! bound, not the successor convention of `BTreeMap` ranges. Window pruning
//! and sample extraction in `vitals-metrics` depend on exactly this choice:
//! pruning walks backward from `upper_bound(cutoff)` over expired entries,
//! and extraction treats its end bound as exclusive.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Index of the shared sentinel slot.
const NIL: usize = 0;

/// Handle to a live node in an [`OrderedIndex`].
///
/// A handle stays valid until the node it names is removed; removal
/// invalidates it (the cell may be recycled for a later insert). Handles
/// are meaningful only for the index that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node<V> {
    key: i64,
    value: Option<V>,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
    size: u64,
}

/// Order-statistic red-black tree with multimap semantics.
///
/// ## Example
///
/// ```
/// use vitals_index::OrderedIndex;
///
/// let mut index = OrderedIndex::new();
/// let a = index.insert(10, "a");
/// index.insert(20, "b");
/// index.insert(10, "c"); // duplicate key, ranks after `a`
///
/// assert_eq!(index.len(), 3);
/// assert_eq!(index.rank(a), 0);
/// assert_eq!(index.find(10), Some(a));
/// assert_eq!(index.upper_bound(20).map(|n| index.key(n)), Some(10));
/// ```
#[derive(Debug)]
pub struct OrderedIndex<V> {
    nodes: Vec<Node<V>>,
    root: usize,
    free: Vec<usize>,
}

impl<V> Default for OrderedIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedIndex<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        let sentinel = Node {
            key: 0,
            value: None,
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
            size: 0,
        };
        OrderedIndex {
            nodes: vec![sentinel],
            root: NIL,
            free: Vec::new(),
        }
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.nodes[self.root].size
    }

    /// Whether the index holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Remove every node and release the arena.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NIL].parent = NIL;
        self.nodes[NIL].left = NIL;
        self.nodes[NIL].right = NIL;
        self.root = NIL;
        self.free.clear();
    }

    /// Key of a live node.
    #[inline]
    pub fn key(&self, node: NodeId) -> i64 {
        self.nodes[node.0].key
    }

    /// Payload of a live node, `None` if the handle is stale.
    #[inline]
    pub fn value(&self, node: NodeId) -> Option<&V> {
        self.nodes[node.0].value.as_ref()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// In-order `rank`-th node (0-indexed), `None` if out of range.
    pub fn find_by_rank(&self, mut rank: u64) -> Option<NodeId> {
        if rank >= self.len() {
            return None;
        }
        let mut n = self.root;
        while n != NIL {
            let left_size = self.nodes[self.nodes[n].left].size;
            if rank == left_size {
                return Some(NodeId(n));
            }
            if rank < left_size {
                n = self.nodes[n].left;
            } else {
                rank -= left_size + 1;
                n = self.nodes[n].right;
            }
        }
        None
    }

    /// Lowest-ranked node with key equal to `key`, `None` if absent.
    pub fn find(&self, key: i64) -> Option<NodeId> {
        let n = self.lower_bound(key)?;
        if self.nodes[n.0].key != key {
            return None;
        }
        Some(n)
    }

    /// Lowest-ranked node with key `>= key` (inclusive), `None` if every key
    /// is smaller.
    pub fn lower_bound(&self, key: i64) -> Option<NodeId> {
        let mut result = None;
        let mut n = self.root;
        while n != NIL {
            if self.nodes[n].key < key {
                n = self.nodes[n].right;
            } else {
                result = Some(NodeId(n));
                n = self.nodes[n].left;
            }
        }
        result
    }

    /// Highest-ranked node with key strictly less than `key`, `None` if
    /// every key is `>= key`.
    pub fn upper_bound(&self, key: i64) -> Option<NodeId> {
        let mut result = None;
        let mut n = self.root;
        while n != NIL {
            if self.nodes[n].key >= key {
                n = self.nodes[n].left;
            } else {
                result = Some(NodeId(n));
                n = self.nodes[n].right;
            }
        }
        result
    }

    /// 0-indexed in-order position of a live node.
    pub fn rank(&self, node: NodeId) -> u64 {
        let mut n = node.0;
        let mut rank = self.nodes[self.nodes[n].left].size;
        while n != self.root {
            let p = self.nodes[n].parent;
            if n == self.nodes[p].right {
                rank += 1 + self.nodes[self.nodes[p].left].size;
            }
            n = p;
        }
        rank
    }

    /// In-order successor.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let mut n = node.0;
        if n == NIL {
            return None;
        }
        if self.nodes[n].right != NIL {
            return Some(NodeId(self.subtree_min(self.nodes[n].right)));
        }
        while n == self.nodes[self.nodes[n].parent].right {
            n = self.nodes[n].parent;
            if n == NIL {
                return None;
            }
        }
        let p = self.nodes[n].parent;
        if p == NIL {
            return None;
        }
        Some(NodeId(p))
    }

    /// In-order predecessor.
    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        let mut n = node.0;
        if n == NIL {
            return None;
        }
        if self.nodes[n].left != NIL {
            return Some(NodeId(self.subtree_max(self.nodes[n].left)));
        }
        while n == self.nodes[self.nodes[n].parent].left {
            n = self.nodes[n].parent;
            if n == NIL {
                return None;
            }
        }
        let p = self.nodes[n].parent;
        if p == NIL {
            return None;
        }
        Some(NodeId(p))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert a key/payload pair and return its handle.
    ///
    /// Equal keys go to the right subtree, so the newest tie receives the
    /// highest rank among equals.
    pub fn insert(&mut self, key: i64, value: V) -> NodeId {
        let mut prev = NIL;
        let mut n = self.root;
        while n != NIL {
            self.nodes[n].size += 1;
            prev = n;
            n = if key < self.nodes[n].key {
                self.nodes[n].left
            } else {
                self.nodes[n].right
            };
        }

        let new = self.alloc(key, value, prev);
        if prev == NIL {
            self.root = new;
        } else if key < self.nodes[prev].key {
            self.nodes[prev].left = new;
        } else {
            self.nodes[prev].right = new;
        }
        self.insert_fix(new);
        NodeId(new)
    }

    /// Remove the lowest-ranked node with key equal to `key`; no-op if the
    /// key is absent.
    pub fn remove_key(&mut self, key: i64) {
        if let Some(n) = self.find(key) {
            self.remove(n);
        }
    }

    /// Remove a node by handle. The handle is invalidated.
    pub fn remove(&mut self, node: NodeId) {
        let n = node.0;
        let mut y = n;
        let mut y_was_black = self.nodes[y].color == Color::Black;
        let x;
        if self.nodes[n].left == NIL {
            x = self.nodes[n].right;
            self.transplant(n, x);
        } else if self.nodes[n].right == NIL {
            x = self.nodes[n].left;
            self.transplant(n, x);
        } else {
            y = self.subtree_min(self.nodes[n].right);
            y_was_black = self.nodes[y].color == Color::Black;
            x = self.nodes[y].right;
            if self.nodes[y].parent == n {
                self.nodes[x].parent = y; // in case x is the sentinel
            } else {
                self.transplant(y, x);
                let nr = self.nodes[n].right;
                self.nodes[y].right = nr;
                self.nodes[nr].parent = y;
            }
            self.transplant(n, y);
            let nl = self.nodes[n].left;
            self.nodes[y].left = nl;
            self.update_size(y);
            self.nodes[nl].parent = y;
            self.nodes[y].color = self.nodes[n].color;
        }
        if y_was_black {
            self.remove_fix(x);
        }
        // re-establish the sentinel invariant
        self.nodes[NIL].parent = NIL;
        self.release(n);
    }

    // =========================================================================
    // Internal plumbing
    // =========================================================================

    fn alloc(&mut self, key: i64, value: V, parent: usize) -> usize {
        let node = Node {
            key,
            value: Some(value),
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
            size: 1,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, n: usize) {
        self.nodes[n].value = None;
        self.nodes[n].size = 0;
        self.nodes[n].parent = NIL;
        self.nodes[n].left = NIL;
        self.nodes[n].right = NIL;
        self.free.push(n);
    }

    #[inline]
    fn is_red(&self, n: usize) -> bool {
        self.nodes[n].color == Color::Red
    }

    fn subtree_min(&self, mut n: usize) -> usize {
        while self.nodes[n].left != NIL {
            n = self.nodes[n].left;
        }
        n
    }

    fn subtree_max(&self, mut n: usize) -> usize {
        while self.nodes[n].right != NIL {
            n = self.nodes[n].right;
        }
        n
    }

    /// Refresh subtree sizes bottom-up from `n`, stopping early once a
    /// recomputed size matches the stored one.
    fn update_size(&mut self, mut n: usize) {
        while n != NIL {
            let new_size =
                self.nodes[self.nodes[n].left].size + self.nodes[self.nodes[n].right].size + 1;
            if self.nodes[n].size == new_size {
                return;
            }
            self.nodes[n].size = new_size;
            n = self.nodes[n].parent;
        }
    }

    fn rotate_left(&mut self, n: usize) {
        let r = self.nodes[n].right;
        if r == NIL {
            return;
        }

        let rl = self.nodes[r].left;
        self.nodes[n].right = rl;
        if rl != NIL {
            self.nodes[rl].parent = n;
        }

        let p = self.nodes[n].parent;
        if p == NIL {
            self.root = r;
        } else if n == self.nodes[p].left {
            self.nodes[p].left = r;
        } else {
            self.nodes[p].right = r;
        }
        self.nodes[r].parent = p;

        self.nodes[r].left = n;
        self.nodes[n].parent = r;

        self.update_size(n);
        self.update_size(r);
    }

    fn rotate_right(&mut self, n: usize) {
        let l = self.nodes[n].left;
        if l == NIL {
            return;
        }

        let lr = self.nodes[l].right;
        self.nodes[n].left = lr;
        if lr != NIL {
            self.nodes[lr].parent = n;
        }

        let p = self.nodes[n].parent;
        if p == NIL {
            self.root = l;
        } else if n == self.nodes[p].right {
            self.nodes[p].right = l;
        } else {
            self.nodes[p].left = l;
        }
        self.nodes[l].parent = p;

        self.nodes[l].right = n;
        self.nodes[n].parent = l;

        self.update_size(n);
        self.update_size(l);
    }

    fn insert_fix(&mut self, mut n: usize) {
        while self.is_red(self.nodes[n].parent) {
            let p = self.nodes[n].parent;
            let g = self.nodes[p].parent;
            if p == self.nodes[g].left {
                let uncle = self.nodes[g].right;
                if self.is_red(uncle) {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    n = g;
                } else {
                    if n == self.nodes[p].right {
                        n = p;
                        self.rotate_left(n);
                    }
                    let p = self.nodes[n].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_right(g);
                }
            } else {
                // symmetric to above
                let uncle = self.nodes[g].left;
                if self.is_red(uncle) {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    n = g;
                } else {
                    if n == self.nodes[p].left {
                        n = p;
                        self.rotate_right(n);
                    }
                    let p = self.nodes[n].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.nodes[root].color = Color::Black;
    }

    /// Detach `src` from its current parent, then attach it where `dst`
    /// hangs. Sizes are refreshed along both spines. Children of `dst` are
    /// the caller's responsibility.
    fn transplant(&mut self, dst: usize, src: usize) {
        let oldp = self.nodes[src].parent;
        if src == self.nodes[oldp].left {
            self.nodes[oldp].left = NIL;
        } else if src == self.nodes[oldp].right {
            self.nodes[oldp].right = NIL;
        }
        self.update_size(oldp);

        let newp = self.nodes[dst].parent;
        if newp == NIL {
            self.root = src;
        } else if dst == self.nodes[newp].left {
            self.nodes[newp].left = src;
        } else {
            self.nodes[newp].right = src;
        }
        self.update_size(newp);
        self.nodes[src].parent = newp;
    }

    fn remove_fix(&mut self, mut n: usize) {
        while n != self.root && !self.is_red(n) {
            let p = self.nodes[n].parent;
            if n == self.nodes[p].left {
                let mut w = self.nodes[p].right;
                if self.is_red(w) {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    w = self.nodes[self.nodes[n].parent].right;
                }
                let wl = self.nodes[w].left;
                let wr = self.nodes[w].right;
                if !self.is_red(wl) && !self.is_red(wr) {
                    self.nodes[w].color = Color::Red;
                    n = self.nodes[n].parent;
                } else {
                    if !self.is_red(wr) {
                        self.nodes[wl].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_right(w);
                        w = self.nodes[self.nodes[n].parent].right;
                    }
                    let p = self.nodes[n].parent;
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    let wr = self.nodes[w].right;
                    self.nodes[wr].color = Color::Black;
                    self.rotate_left(p);
                    n = self.root;
                }
            } else {
                // symmetric to above
                let mut w = self.nodes[p].left;
                if self.is_red(w) {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    w = self.nodes[self.nodes[n].parent].left;
                }
                let wr = self.nodes[w].right;
                let wl = self.nodes[w].left;
                if !self.is_red(wr) && !self.is_red(wl) {
                    self.nodes[w].color = Color::Red;
                    n = self.nodes[n].parent;
                } else {
                    if !self.is_red(wl) {
                        self.nodes[wr].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_left(w);
                        w = self.nodes[self.nodes[n].parent].left;
                    }
                    let p = self.nodes[n].parent;
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    let wl = self.nodes[w].left;
                    self.nodes[wl].color = Color::Black;
                    self.rotate_right(p);
                    n = self.root;
                }
            }
        }
        self.nodes[n].color = Color::Black;
    }
}

// ============================================================================
// Tests
// ============================================================================
