use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod heap_primitives;

// Search space and problems
// -------------------------
pub mod problem;
pub mod search;
pub mod space;

// Problems
// --------
pub mod problems;

// Algorithms
// ----------
pub mod algorithms;

// Grid pathfinding
// ----------------
pub mod pathfinder;
pub mod render;
