// src/view/mod.rs
// =============================================================================
// The seams between the traversal engine and the remote source.
//
// Submodules:
// - listing: link-based views (fetch an HTML directory listing per location)
// - widget: click-based views (read rows of a rendered tree widget)
// - stabilize: the two-phase row-count wait used by widget transitions
//
// The engine only talks to the two traits below. It never catches broad
// failures from a backend; every transient condition comes back as a typed
// value (Row, Transition, ViewError) and the engine branches on it.
// =============================================================================

pub mod listing;
pub mod stabilize;
pub mod widget;

use async_trait::async_trait;

use crate::error::ViewError;
use crate::model::{Node, TraversalContext};

pub use listing::{LinkNavigator, LinkView};
pub use widget::WidgetSession;

/// What reading one row of a snapshot produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Node(Node),
    /// A structural row such as "return to parent". Not content.
    Placeholder,
    /// Fewer cells than a content row needs.
    Degenerate { columns: usize },
    /// A row whose type is neither directory nor file.
    Unclassified { name: String },
}

/// Outcome of a navigation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stabilized,
    /// The stabilization wait exhausted its retry budget. `left_parent` is
    /// set when the old rows were torn down, so the view may now be inside
    /// the target and needs an exit.
    Timeout { attempts: u32, left_parent: bool },
    /// The target row could no longer be found in the current view.
    Stale,
    /// Another element overlapped the target and took the click.
    Intercepted,
}

/// Produces the child rows of the active context.
#[async_trait]
pub trait ViewProvider: Send {
    /// Takes a fresh snapshot of the view at `ctx` and returns its row count.
    async fn snapshot(&mut self, ctx: &TraversalContext) -> Result<usize, ViewError>;

    /// Reads one row of the latest snapshot.
    ///
    /// Returns `ViewError::Stale` when the view changed since the snapshot.
    async fn read_row(&mut self, ctx: &TraversalContext, index: usize) -> Result<Row, ViewError>;

    /// Rows structurally expected at a level; fewer means the level is empty.
    fn min_rows(&self) -> usize {
        1
    }
}

/// Moves the remote view between contexts.
#[async_trait]
pub trait Navigator: Send {
    /// Transitions into `child`, blocking until the view is stable again.
    async fn enter(&mut self, parent: &TraversalContext, child: &Node) -> Result<Transition, ViewError>;

    /// Transitions from `ctx` back to its parent.
    async fn exit(&mut self, ctx: &TraversalContext) -> Result<Transition, ViewError>;

    /// False when entering a child does not change shared view state, so
    /// `exit` need not be called.
    fn is_stateful(&self) -> bool {
        true
    }
}
