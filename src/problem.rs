use crate::space::Action;
use crate::space::Cost;
use crate::space::Space;
use crate::space::State;

/// A search Space with a single start and a single goal.
pub trait Problem<Sp, St, A, C>: std::fmt::Debug + Sized
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn space(&self) -> &Sp;
    fn start(&self) -> St;
    fn goal(&self) -> St;

    #[inline(always)]
    fn is_goal(&self, s: &St) -> bool {
        *s == self.goal()
    }

    /// Builds a new instance over the same Space with random endpoints.
    fn randomize<R: rand::Rng>(&self, r: &mut R) -> Option<Self>;
}
