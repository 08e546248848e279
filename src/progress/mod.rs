//! Weighted progress aggregation
//!
//! A [`ProgressUnit`] is a node in a small owned tree. Each node has a fixed
//! unit total, some explicitly completed units, and children registered with a
//! weight (the number of the parent's units the child stands for). A parent
//! computes its fraction on read:
//!
//! ```text
//! fraction = (completed + sum(child.fraction() * child.weight)) / total
//! ```
//!
//! Leaves may move backwards (a retried step resets its progress); the
//! aggregator reports whatever the leaves say. Smoothing for display is the job
//! of [`MonotoneDisplay`], which sits on the consumer side.
//!
//! Every node in a tree shares one `tokio::sync::watch` channel, so observers
//! of the root wake whenever any leaf changes and then read the root's fraction.

pub mod display;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

pub use display::ProgressDisplay;

/// Unit total used for every pipeline-level progress node
pub const TOTAL_UNITS: u64 = 100;

/// Handle to one node of a progress tree. Clones share the node.
#[derive(Clone)]
pub struct ProgressUnit {
    node: Arc<Node>,
}

struct Node {
    total: u64,
    state: Mutex<NodeState>,
}

struct NodeState {
    completed: u64,
    children: Vec<Child>,
    notifier: Arc<watch::Sender<u64>>,
}

struct Child {
    weight: u64,
    unit: ProgressUnit,
}

impl ProgressUnit {
    /// Create a root node with `total` units (at least one)
    pub fn new(total: u64) -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            node: Arc::new(Node {
                total: total.max(1),
                state: Mutex::new(NodeState {
                    completed: 0,
                    children: Vec::new(),
                    notifier: Arc::new(sender),
                }),
            }),
        }
    }

    /// Create a node with the standard 100-unit total
    pub fn discrete() -> Self {
        Self::new(TOTAL_UNITS)
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.node
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the explicitly completed units of this node.
    ///
    /// Values above the room left by child weights are clamped.
    pub fn set_completed(&self, units: u64) {
        let notifier = {
            let mut state = self.state();
            let reserved: u64 = state.children.iter().map(|c| c.weight).sum();
            state.completed = units.min(self.node.total.saturating_sub(reserved));
            Arc::clone(&state.notifier)
        };
        bump(&notifier);
    }

    /// Set the explicit completion of this node as a fraction of its own total
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn set_fraction(&self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.set_completed((fraction * self.node.total as f64).round() as u64);
    }

    /// Mark this node's explicit share done
    pub fn finish(&self) {
        self.set_completed(self.node.total);
    }

    /// Register `child` as standing for `weight` of this node's units.
    ///
    /// The weight is clamped so explicit units plus child weights never exceed
    /// the total. Registering a node under itself is ignored.
    pub fn add_child(&self, child: &ProgressUnit, weight: u64) {
        if Arc::ptr_eq(&self.node, &child.node) {
            return;
        }

        let notifier = {
            let mut state = self.state();
            let used: u64 = state.completed + state.children.iter().map(|c| c.weight).sum::<u64>();
            let weight = weight.min(self.node.total.saturating_sub(used));
            child.adopt(&state.notifier);
            state.children.push(Child {
                weight,
                unit: child.clone(),
            });
            Arc::clone(&state.notifier)
        };
        bump(&notifier);
    }

    fn adopt(&self, notifier: &Arc<watch::Sender<u64>>) {
        let mut state = self.state();
        state.notifier = Arc::clone(notifier);
        for child in &state.children {
            child.unit.adopt(notifier);
        }
    }

    /// Fractional completion in `[0, 1]`
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        let state = self.state();
        let children: f64 = state
            .children
            .iter()
            .map(|c| c.unit.fraction() * c.weight as f64)
            .sum();
        ((state.completed as f64 + children) / self.node.total as f64).clamp(0.0, 1.0)
    }

    /// Receiver that changes whenever any node in this tree changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state().notifier.subscribe()
    }
}

impl std::fmt::Debug for ProgressUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressUnit")
            .field("total", &self.node.total)
            .field("fraction", &self.fraction())
            .finish()
    }
}

fn bump(notifier: &watch::Sender<u64>) {
    notifier.send_modify(|version| *version = version.wrapping_add(1));
}

/// Display filter that never shows a decrease.
///
/// Forward jumps apply immediately; backward jumps are held at the highest
/// value shown so far until the raw value catches up.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotoneDisplay {
    shown: f64,
}

impl MonotoneDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw fraction and get the value to display
    pub fn apply(&mut self, raw: f64) -> f64 {
        if raw > self.shown {
            self.shown = raw.min(1.0);
        }
        self.shown
    }

    pub fn shown(&self) -> f64 {
        self.shown
    }

    /// Start over for a new pipeline run
    pub fn reset(&mut self) {
        self.shown = 0.0;
    }
}
