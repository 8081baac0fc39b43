//! The contract between label-typed settings and the dependency graph that evaluates targets.
//!
//! The engine doesn't own the graph or its scheduling. A label setting declares one edge per
//! label with [`DependencyGraph::declare_dependency`] and returns to the host, which re-invokes
//! the evaluation once the dependencies are done.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use pb_types::Label;

use crate::configuration::ConfigurationKey;
use crate::value::NodeOutput;

/// A node in the dependency graph, a target evaluated under a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub label: Label,
    pub configuration: ConfigurationKey,
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.configuration)
    }
}

/// State of a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// The node has not finished evaluating.
    Pending,
    /// The node finished and produced an output.
    Done(NodeOutput),
    /// Evaluation of the node failed.
    Failed(Arc<str>),
}

/// The host's dependency graph.
///
/// Implementations must not block, they're called from within evaluations running on the
/// host's worker threads.
pub trait DependencyGraph: Send + Sync {
    /// Declare an edge from the current evaluation to `node`, scheduling it if necessary.
    fn declare_dependency(&self, node: &NodeKey);

    /// Returns the current state of `node`.
    fn node_state(&self, node: &NodeKey) -> NodeState;
}

/// A [`DependencyGraph`] where the host completes targets by hand.
///
/// Targets are completed for every configuration at once. Used by the CLI, where target
/// outputs come from the settings file, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    /// State of each target, a missing target is pending.
    targets: DashMap<Label, NodeState>,
    /// Number of times an edge to each node was declared.
    declared: DashMap<NodeKey, usize>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        InMemoryGraph::default()
    }

    /// Mark `label` as evaluated with `output`.
    pub fn complete(&self, label: Label, output: NodeOutput) {
        tracing::trace!(%label, "completed target");
        self.targets.insert(label, NodeState::Done(output));
    }

    /// Mark `label` as failed for `reason`.
    pub fn fail(&self, label: Label, reason: impl Into<Arc<str>>) {
        tracing::trace!(%label, "failed target");
        self.targets.insert(label, NodeState::Failed(reason.into()));
    }

    /// Number of times an edge to `node` was declared.
    pub fn declarations(&self, node: &NodeKey) -> usize {
        self.declared.get(node).map(|count| *count.value()).unwrap_or(0)
    }

    /// Every node an edge was declared to.
    pub fn declared_nodes(&self) -> Vec<NodeKey> {
        self.declared.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl DependencyGraph for InMemoryGraph {
    fn declare_dependency(&self, node: &NodeKey) {
        *self.declared.entry(node.clone()).or_insert(0) += 1;
    }

    fn node_state(&self, node: &NodeKey) -> NodeState {
        self.targets
            .get(&node.label)
            .map(|state| state.value().clone())
            .unwrap_or(NodeState::Pending)
    }
}
