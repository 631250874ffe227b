use std::cmp::min;
use std::marker::PhantomData;

use derive_more::Display;
use rustc_hash::FxHashMap;

use crate::heap_primitives::index_best;
use crate::problem::Problem;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Heuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// The ranking tuple for A*
///
/// We prefer better f-values, tie break for lower h, and finally for the
/// earliest pushed entry so equal-cost searches are reproducible.
///
/// Keeping the raw h value helps to avoid recomputing it later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarRank<C: Cost> {
    f: C,
    h: C,
    sequence: u64,
}
impl<C> AStarRank<C>
where
    C: Cost,
{
    pub fn new(g: C, h: C, sequence: u64) -> Self {
        Self {
            f: g.saturating_add(&h),
            h,
            sequence,
        }
    }
    pub fn f(&self) -> C {
        self.f
    }
    pub fn h(&self) -> C {
        self.h
    }
}

const HEAP_ARITY: usize = 4usize;
#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    crate::heap_primitives::index_parent::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    crate::heap_primitives::index_first_children::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_right(i: usize) -> usize {
    crate::heap_primitives::index_last_children::<HEAP_ARITY>(i)
}

/// An entry of the open list.
///
/// Entries are never updated in place. A node that gets a better path gets a
/// fresh entry and the old one goes stale, which is detected on pop by
/// comparing `g` with the node's current `g`.
#[derive(Debug, Clone)]
pub struct AStarHeapNode<C>
where
    C: Cost,
{
    /// The rank of this node that defines how good it is.
    pub rank: AStarRank<C>,
    /// The index of this node in the Search Tree
    pub node_index: SearchTreeIndex,
    /// The g-value the node had when this entry was pushed.
    pub g: C,
}

impl<C: Cost> PartialEq for AStarHeapNode<C> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.rank.eq(&other.rank)
    }
}
impl<C: Cost> Eq for AStarHeapNode<C> {}

impl<C: Cost> PartialOrd for AStarHeapNode<C> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<C: Cost> Ord for AStarHeapNode<C> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank.cmp(&other.rank)
    }
}

/// Counters describing the work done by a search.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq)]
#[display(
    "expanded={expanded} generated={generated} improved={improved} stale={stale}"
)]
pub struct SearchStats {
    /// Nodes closed and expanded.
    pub expanded: usize,
    /// Nodes created for newly seen States.
    pub generated: usize,
    /// Open nodes reached again through a cheaper path.
    pub improved: usize,
    /// Open list entries discarded on pop.
    pub stale: usize,
}

#[derive(Debug)]
pub struct AStarSearch<H, P, Sp, St, A, C>
where
    H: Heuristic<Sp, St, A, C>,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// All the Search Nodes. Naturally forms a Search Tree rooted at the start
    /// as each node may have a parent Node.
    search_tree: SearchTree<St, A, C>,

    /// A min-heap of `(AStarRank, SearchTreeIndex, g)` entries, possibly
    /// stale.
    open: Vec<AStarHeapNode<C>>,

    /// Amalgamation of,
    /// - The `HashMap<St, SearchTreeNode>`, but using `SearchTreeIndex`
    ///   - To find existing Search Nodes from their `State`.
    /// - The "Closed Set" `HashSet<St>`
    ///   - To recall whether we had already expanded a state.
    ///
    /// It's the same size as the Search Tree.
    node_map: FxHashMap<St, SearchTreeIndex>,

    /// Next tie-breaking sequence number.
    sequence: u64,
    stats: SearchStats,

    problem: P,

    _phantom_heuristic: PhantomData<H>,
    _phantom_space: PhantomData<Sp>,
}

impl<H, P, Sp, St, A, C> AStarSearch<H, P, Sp, St, A, C>
where
    H: Heuristic<Sp, St, A, C>,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(problem: P) -> Self {
        let start = problem.start();

        let mut search = Self {
            search_tree: SearchTree::<St, A, C>::new(),
            open: Vec::with_capacity(256),
            node_map: FxHashMap::default(),
            sequence: 0,
            stats: SearchStats::default(),

            problem,

            _phantom_heuristic: PhantomData,
            _phantom_space: PhantomData,
        };

        let h = search.h(&start);
        search.push_new(&start, None, C::zero(), h);

        search
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Runs the search until the goal is popped or the open list runs dry.
    ///
    /// The first time the goal is popped its path is optimal as long as the
    /// heuristic is admissible. Following calls return `None`.
    #[must_use]
    pub fn find_path(&mut self) -> Option<Path<St, A, C>> {
        while let Some(heap_node) = self.pop() {
            let node_index = heap_node.node_index;
            let state = *self.search_tree[node_index].state();
            let g: C = self.search_tree[node_index].g();

            // Lazy deletion of entries superseded by a cheaper path.
            if self.is_closed(&state) || heap_node.g != g {
                self.stats.stale += 1;
                continue;
            }

            if self.problem.is_goal(&state) {
                self.mark_closed(&state);
                self.open.clear();
                log::debug!(
                    "Reached {state:?} with cost {g} ({}, {} nodes)",
                    self.stats,
                    self.search_tree.len()
                );
                return Some(self.search_tree.path(self.problem.space(), node_index));
            }

            // Mark as closed
            self.mark_closed(&state);
            self.stats.expanded += 1;
            log::trace!("Expanding {state:?} (g={g}, {:?})", heap_node.rank);

            // Expand state
            for (s, a) in self.problem.space().neighbours(&state) {
                let c: C = self.problem.space().cost(&state, &a);
                let new_g = g.saturating_add(&c);

                // Have we seen this State?
                match self.node_map.get(&s).copied() {
                    Some(neigh_index) => {
                        if neigh_index.is_closed() {
                            // Yes, and we expanded the State already.
                            continue;
                        }

                        // Yes, but it's still open. Update the existing Node
                        // if needed.
                        let neigh = &mut self.search_tree[neigh_index];
                        if new_g < neigh.g() {
                            neigh.reach((node_index, a), new_g);
                            self.stats.improved += 1;
                            let h = self.h(&s);
                            self.push_entry(neigh_index, new_g, h);
                        }
                    }
                    None => {
                        // No, let's create a new Node for it.
                        let h = self.h(&s);
                        self.push_new(&s, Some((node_index, a)), new_g, h);
                    }
                }
            }
        }

        log::debug!(
            "Exhausted the open list without reaching {:?} ({})",
            self.problem.goal(),
            self.stats
        );
        None
    }

    #[inline(always)]
    #[must_use]
    pub(crate) fn h(&self, s: &St) -> C {
        H::h(s, &self.problem.goal())
    }

    #[inline(always)]
    #[must_use]
    pub(crate) fn is_closed(&self, s: &St) -> bool {
        match self.node_map.get(s) {
            Some(node_index) => node_index.is_closed(),
            None => false,
        }
    }
    #[inline(always)]
    fn mark_closed(&mut self, s: &St) {
        if let Some(node_index) = self.node_map.get_mut(s) {
            if !node_index.is_closed() {
                node_index.set_closed();
            }
        } else {
            debug_assert!(false, "Tried closing a state without a node");
        }
    }

    #[inline(always)]
    fn push_new(&mut self, s: &St, parent: Option<(SearchTreeIndex, A)>, g: C, h: C) {
        debug_assert!(!self.is_closed(s));
        debug_assert!(!self.node_map.contains_key(s));

        // 1. Add SearchTreeNode to search_tree
        let node_index = self
            .search_tree
            .push(SearchTreeNode::<St, A, C>::new(*s, parent, g));

        // 2. Add entry to node_map
        self.node_map.insert(*s, node_index);
        self.stats.generated += 1;

        // 3. Add AStarHeapNode to open using it's SearchTreeIndex
        self.push_entry(node_index, g, h);
    }

    #[inline(always)]
    fn push_entry(&mut self, node_index: SearchTreeIndex, g: C, h: C) {
        let rank = AStarRank::new(g, h, self.sequence);
        self.sequence += 1;

        self.open.push(AStarHeapNode {
            rank,
            node_index,
            g,
        });
        self.sift_up(self.open.len() - 1);

        self.verify_heap();
    }

    #[inline(always)]
    #[must_use]
    fn pop(&mut self) -> Option<AStarHeapNode<C>> {
        match self.open.len() {
            0 | 1 => self.open.pop(),
            _ => {
                let top = self.open.swap_remove(0);
                self.sift_down(0);
                self.verify_heap();
                Some(top)
            }
        }
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        // Every node goes after its parent node, if any.
        for i in 1..self.open.len() {
            let p = up(i);
            assert!(
                self.open[p].rank <= self.open[i].rank,
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.open[p],
                self.open[i],
                self.open.len(),
            );
        }
    }

    /// Raises a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_up(&mut self, index: usize) -> usize {
        debug_assert!(
            index < self.open.len(),
            "Index {index} is out of bounds of the heap"
        );

        let mut pos = index;
        while pos != 0 {
            let parent = up(pos);
            if self.open[parent].rank <= self.open[pos].rank {
                break;
            }
            self.open.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.open.len();
        if len == 0 {
            return index;
        }
        debug_assert!(index < len, "Index {index} is out of bounds of the heap");

        loop {
            // Find the best child
            let first = down_left(index);
            if first >= len {
                break;
            }
            let last = min(down_right(index), len - 1);
            let child = first + index_best(&self.open[first..=last]);

            if self.open[index].rank <= self.open[child].rank {
                break;
            }

            self.open.swap(index, child);
            index = child;
        }
        index
    }

    pub fn write_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "AStarSearch Stats:")?;
        let s = size_of::<SearchTreeNode<St, A, C>>();
        let l = self.search_tree.len();
        let c = self.search_tree.capacity();
        writeln!(
            out,
            "  - |Nodes|:  {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        let s = size_of::<AStarHeapNode<C>>();
        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(
            out,
            "  - |Open|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        let s = size_of::<(St, SearchTreeIndex)>();
        let l = self.node_map.len();
        let c = self.node_map.capacity();
        writeln!(
            out,
            "  - |Index|:  {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        writeln!(
            out,
            "  - Expanded nodes:  {}",
            self.stats.expanded.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Generated nodes: {}",
            self.stats.generated.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Improved nodes:  {}",
            self.stats.improved.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Stale entries:   {}",
            self.stats.stale.separate_with_commas()
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    use crate::pathfinder::Grid2DAStarSearch as Grid2DAStar;
    use crate::problems::grid_2d::Cell;
    use crate::problems::grid_2d::Grid2DAction;
    use crate::problems::grid_2d::Grid2DCost;
    use crate::problems::grid_2d::Grid2DProblem;
    use crate::problems::grid_2d::Grid2DSpace;
    use crate::problems::grid_2d::parse_problem;

    #[test]
    fn ranking_grid2d() {
        let c0: Grid2DCost = 0u32;
        let c1: Grid2DCost = 1u32;
        let c2: Grid2DCost = 2u32;

        let g = c2;
        let h_low = c0;
        let h_high = c1;
        assert!(AStarRank::new(g, h_low, 0) < AStarRank::new(g, h_high, 0));
        assert!(AStarRank::new(g, h_high, 0) == AStarRank::new(g, h_high, 0));
        assert!(AStarRank::new(g, h_high, 0) > AStarRank::new(g, h_low, 0));

        // Same f-value, needs tie-breaking on h
        let low = AStarRank::new(c2, c0, 1);
        let high = AStarRank::new(c0, c2, 0);
        assert!(low < high);
        assert!(low.f() == high.f());
        assert!(low.h() < high.h());

        // Same f and h, earlier entries win
        assert!(AStarRank::new(c1, c1, 3) < AStarRank::new(c1, c1, 4));
    }

    #[test]
    fn solve_wall_detour() {
        let (space, start, goal) = parse_problem(indoc! {"
            S.......
            ...#....
            ...#....
            ...#....
            ...#....
            .......G
        "})
        .unwrap();
        let mut search = Grid2DAStar::new(Grid2DProblem::new(&space, start, goal));
        let path = search.find_path().unwrap();

        assert_eq!(path.start(), start);
        assert_eq!(path.end(), goal);
        assert_eq!(path.len(), 12);
        assert_eq!(path.cost(), 12);
        assert!(space.valid_path(&path));

        let stats = search.stats();
        assert!(stats.expanded > 0);
        assert!(stats.generated >= path.states().len());

        // The goal is only reported once.
        assert_eq!(search.find_path(), None);
    }

    #[test]
    fn solve_around_a_maze() {
        let (space, start, goal) = parse_problem(indoc! {"
            S.#.....
            #.#.###.
            ..#...#.
            .####.#.
            ......#G
        "})
        .unwrap();
        let path = Grid2DAStar::new(Grid2DProblem::new(&space, start, goal))
            .find_path()
            .unwrap();

        assert!(space.valid_path(&path));
        assert_eq!(path.len(), 25);
    }

    #[test]
    fn unreachable_goal() {
        let (space, start, goal) = parse_problem(indoc! {"
            S.#..
            ..#.G
            ..#..
        "})
        .unwrap();
        let mut search = Grid2DAStar::new(Grid2DProblem::new(&space, start, goal));
        assert_eq!(search.find_path(), None);

        // Every reachable cell on the left got closed.
        assert_eq!(search.stats().expanded, 6);
        assert_eq!(search.stats().generated, 6);
    }

    #[test]
    fn cheaper_paths_replace_entries() {
        // An inconsistent heuristic that sends the search around the bottom
        // first, so (2,0) is reached with g=4 before the direct g=2.
        #[derive(Debug)]
        struct Misleading;
        impl Heuristic<Grid2DSpace, Cell, Grid2DAction, Grid2DCost> for Misleading {
            fn h(a: &Cell, _b: &Cell) -> Grid2DCost {
                match (a.x(), a.y()) {
                    (1, 0) => 5,
                    (2, 0) => 10,
                    _ => 0,
                }
            }
        }

        let (space, start, goal) = parse_problem(indoc! {"
            S..G
            ...#
        "})
        .unwrap();
        let mut search = AStarSearch::<
            Misleading,
            Grid2DProblem,
            Grid2DSpace,
            Cell,
            Grid2DAction,
            Grid2DCost,
        >::new(Grid2DProblem::new(&space, start, goal));
        let path = search.find_path().unwrap();

        assert!(space.valid_path(&path));
        assert_eq!(path.len(), 3);
        assert_eq!(
            path.actions(),
            &[Grid2DAction::Right, Grid2DAction::Right, Grid2DAction::Right]
        );
        assert_eq!(search.stats().improved, 1);
    }

    #[test]
    fn stats_report() {
        let space = Grid2DSpace::new_empty_with_dimensions(5, 5).unwrap();
        let start = Cell::new(0, 0).unwrap();
        let goal = Cell::new(4, 4).unwrap();
        let mut search = Grid2DAStar::new(Grid2DProblem::new(&space, start, goal));
        assert!(search.find_path().is_some());

        let mut out = Vec::new();
        search.write_stats(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        assert!(report.starts_with("AStarSearch Stats:\n"));
        assert!(report.contains("Expanded nodes"));
        assert!(search.stats().to_string().starts_with("expanded="));
    }
}
