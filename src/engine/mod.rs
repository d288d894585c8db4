// src/engine/mod.rs
// =============================================================================
// The traversal engine.
//
// One engine instance walks one hierarchy, depth-first and on a single task.
// It owns everything that changes during a run (visited set, counters,
// accumulated matches), so several runs never share state.
//
// Submodules:
// - traversal: the recursion, per-level algorithm, and recovery paths
// - visited: link-based visited set
// =============================================================================

mod traversal;
mod visited;

pub use traversal::TraversalEngine;
pub use visited::VisitedSet;
