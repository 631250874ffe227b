use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// The bit used to track `is_closed: bool` within indices.
const IS_CLOSED_BIT: usize = 1usize;
/// Arena slots are stored above the closed bit.
const SLOT_SHIFT: u32 = 1;

/// A reference to a `SearchTreeNode<St, A, C>`.
///
/// It's more like a `(usize, bool)` underneath to help track whether the node
/// is closed. We steal the lowest bit of the arena slot so the node map stays
/// one word per entry.
#[derive(Copy, Clone, Debug)]
pub struct SearchTreeIndex {
    index: usize,
}

impl SearchTreeIndex {
    #[inline(always)]
    fn new(slot: usize) -> Self {
        debug_assert!(slot <= (usize::MAX >> SLOT_SHIFT), "Arena overflow");
        Self {
            index: slot << SLOT_SHIFT,
        }
    }

    #[inline(always)]
    pub fn slot(&self) -> usize {
        self.index >> SLOT_SHIFT
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.index & IS_CLOSED_BIT == IS_CLOSED_BIT
    }
    #[inline(always)]
    pub fn set_closed(&mut self) {
        debug_assert!(!self.is_closed());
        self.index |= IS_CLOSED_BIT;
    }
}

/// Indices refer to the same node regardless of their closed bit.
impl PartialEq for SearchTreeIndex {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.slot() == other.slot()
    }
}
impl Eq for SearchTreeIndex {}

#[derive(Debug, Clone)]
pub struct SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub(crate) parent: Option<(SearchTreeIndex, A)>,
    pub(crate) state: St,
    pub(crate) g: C,
}

impl<St, A, C> SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn new(s: St, parent: Option<(SearchTreeIndex, A)>, g: C) -> Self {
        Self {
            parent,
            state: s,
            g,
        }
    }

    /// Gives this Node a better path through a new parent.
    pub fn reach(&mut self, new_parent: (SearchTreeIndex, A), g: C) {
        debug_assert!(g < self.g);
        self.parent = Some(new_parent);
        self.g = g;
    }

    #[inline(always)]
    pub fn state(&self) -> &St {
        &self.state
    }
    #[inline(always)]
    pub fn g(&self) -> C {
        self.g
    }
}

/// All the Search Nodes, linked to their parents by index.
///
/// Nodes are only ever added, so an index stays valid for the lifetime of the
/// tree and the parent links can't form cycles.
pub(crate) struct SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchTreeNode<St, A, C>>,
}

impl<St, A, C> SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, node: SearchTreeNode<St, A, C>) -> SearchTreeIndex {
        let index = SearchTreeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Walks parent links from `node_index` back to its root.
    #[must_use]
    pub fn path<Sp: Space<St, A, C>>(
        &self,
        space: &Sp,
        mut node_index: SearchTreeIndex,
    ) -> Path<St, A, C> {
        let e = &self[node_index];
        let mut path = Path::<St, A, C>::new_from_start(*e.state());

        while let Some((parent_index, a)) = self[node_index].parent {
            let p = &self[parent_index];
            let s = p.state();
            let c: C = space.cost(s, &a);
            debug_assert!(c != C::zero());

            path.append((*s, a), c);
            debug_assert!(node_index != parent_index);
            node_index = parent_index;
        }

        path.reverse();
        path
    }
}

impl<St, A, C> Default for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<St, A, C> std::ops::Index<SearchTreeIndex> for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    type Output = SearchTreeNode<St, A, C>;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.slot()]
    }
}

impl<St, A, C> std::ops::IndexMut<SearchTreeIndex> for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn index_mut(&mut self, index: SearchTreeIndex) -> &mut SearchTreeNode<St, A, C> {
        &mut self.nodes[index.slot()]
    }
}

impl<St, A, C> std::fmt::Debug for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}
