use std::fmt::Debug;
use std::hash::Hash;

use num_traits::SaturatingAdd;
use num_traits::bounds::UpperBounded;
use smallvec::SmallVec;

pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash {}
pub trait Cost:
    Copy
    + Debug
    + std::fmt::Display
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + SaturatingAdd
    + UpperBounded
    + num_traits::Zero
    + num_traits::One
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::AddAssign
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != <Self as UpperBounded>::max_value()
    }
}

/// Neighbours reachable from a State.
///
/// Sized for 4-connected grids, larger expansions spill to the heap.
pub type Neighbours<St, A> = SmallVec<[(St, A); 4]>;

/// A sequence of States joined by Actions.
///
/// `actions[i]` takes `states[i]` into `states[i + 1]`, so there's always one
/// more State than Actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    states: Vec<St>,
    actions: Vec<A>,
    cost: C,
}

impl<St, A, C> Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub fn new_from_start(start: St) -> Self {
        Self {
            states: vec![start],
            actions: vec![],
            cost: C::zero(),
        }
    }

    #[inline(always)]
    pub fn start(&self) -> St {
        self.states[0]
    }
    #[inline(always)]
    pub fn end(&self) -> St {
        self.states[self.states.len() - 1]
    }
    #[inline(always)]
    pub fn cost(&self) -> C {
        self.cost
    }
    #[inline(always)]
    pub fn states(&self) -> &[St] {
        &self.states
    }
    #[inline(always)]
    pub fn actions(&self) -> &[A] {
        &self.actions
    }
    pub fn into_states(self) -> Vec<St> {
        self.states
    }

    /// The number of steps taken.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.actions.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs sanity checks
    #[inline(always)]
    pub fn seems_valid(&self) -> bool {
        self.states.len() == self.actions.len() + 1 && self.cost.valid()
    }

    /// Extends the Path with a new State reached through `action`.
    #[inline(always)]
    pub(crate) fn append(&mut self, step: (St, A), c: C) {
        let (s, a) = step;
        self.actions.push(a);
        self.states.push(s);
        self.cost = self.cost.saturating_add(&c);
    }

    /// Reverses the Path.
    ///
    /// Useful when naturally reconstructing paths in reverse. The Actions are
    /// not inverted, so appending `(parent, action_into_child)` pairs while
    /// walking back from the end yields a valid Path once reversed.
    pub(crate) fn reverse(&mut self) {
        self.states.reverse();
        self.actions.reverse();
    }
}

impl<St, A, C> std::fmt::Display for Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Path({}, {:?}:{:?}:{:?})",
            self.cost,
            self.start(),
            self.actions.iter().take(20).collect::<Vec<_>>(),
            self.end()
        )
    }
}

pub trait Space<St, A, C>: Clone + std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Applies an Action, returning the new State if it can be occupied.
    fn apply(&self, s: &St, a: &A) -> Option<St>;

    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }
    /// Expands a State
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;
    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        if !p.seems_valid() || !self.valid(&p.start()) {
            return false;
        }

        let mut cost = C::zero();
        for (pair, a) in p.states().windows(2).zip(p.actions()) {
            if self.apply(&pair[0], a) != Some(pair[1]) {
                return false;
            }
            cost = cost.saturating_add(&self.cost(&pair[0], a));
        }
        cost == p.cost()
    }

    fn size(&self) -> Option<usize> {
        None
    }
}

/// An estimate of the cost between two States.
pub trait Heuristic<Sp, St, A, C>: std::fmt::Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn h(_a: &St, _b: &St) -> C {
        C::zero()
    }
}
