//! Resolution of label-typed settings against the dependency graph.
//!
//! Resolving is split in two halves. [`LabelResolver::resolve`] declares an edge to the labeled
//! target and immediately returns a [`DeferredNodeRef`]. Once the graph reports the target as
//! complete, [`LabelResolver::extract_value`] reads what it produced. A `label_list` fans out to
//! one edge per label and only produces a value once every edge completed, if any edge fails the
//! whole setting fails.

use std::fmt;
use std::sync::Arc;

use pb_ore::id_gen::AtomicGen;
use pb_types::Label;
use smallvec::SmallVec;

use crate::configuration::ConfigurationKey;
use crate::graph::{DependencyGraph, NodeKey, NodeState};
use crate::value::{ResolvedLabel, ResolvedValue, SettingType};
use crate::Error;

/// Deferred references for a single setting, one per label.
pub type DeferredNodeRefs = SmallVec<[DeferredNodeRef; 2]>;

/// ID of a [`DeferredNodeRef`], unique per [`LabelResolver`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeferredId(u64);

impl From<u64> for DeferredId {
    fn from(value: u64) -> Self {
        DeferredId(value)
    }
}

/// Placeholder for the eventual output of a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredNodeRef {
    id: DeferredId,
    node: NodeKey,
}

impl DeferredNodeRef {
    pub fn id(&self) -> DeferredId {
        self.id
    }

    pub fn node(&self) -> &NodeKey {
        &self.node
    }

    pub fn label(&self) -> &Label {
        &self.node.label
    }
}

impl fmt::Display for DeferredNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id.0, self.node)
    }
}

/// Readiness of a set of [`DeferredNodeRef`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Every node completed successfully.
    Ready,
    /// At least one node failed, `label` is the first failure in declaration order.
    Failed { label: Label, reason: Arc<str> },
    /// Nothing failed yet, but these nodes are still pending.
    Pending(DeferredNodeRefs),
}

/// Bridges label-typed settings to the host's [`DependencyGraph`].
pub struct LabelResolver {
    graph: Arc<dyn DependencyGraph>,
    ids: AtomicGen<DeferredId>,
}

impl fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelResolver").finish_non_exhaustive()
    }
}

impl LabelResolver {
    pub fn new(graph: Arc<dyn DependencyGraph>) -> Self {
        LabelResolver {
            graph,
            ids: AtomicGen::default(),
        }
    }

    /// Declare a dependency on `label` under `configuration`, returns a reference to its
    /// eventual output. Never blocks.
    pub fn resolve(&self, label: &Label, configuration: &ConfigurationKey) -> DeferredNodeRef {
        let node = NodeKey {
            label: label.clone(),
            configuration: configuration.clone(),
        };
        self.graph.declare_dependency(&node);

        let deferred = DeferredNodeRef {
            id: self.ids.next(),
            node,
        };
        tracing::trace!(%deferred, "declared label dependency");
        deferred
    }

    /// Declare a dependency on every label, in order.
    pub fn resolve_all<'a>(
        &self,
        labels: impl IntoIterator<Item = &'a Label>,
        configuration: &ConfigurationKey,
    ) -> DeferredNodeRefs {
        labels
            .into_iter()
            .map(|label| self.resolve(label, configuration))
            .collect()
    }

    /// Check whether all of `deferred` have completed.
    ///
    /// A failure takes precedence over pending nodes, there is no point waiting on the rest.
    pub fn poll(&self, deferred: &[DeferredNodeRef]) -> Readiness {
        let mut pending = DeferredNodeRefs::new();
        for reference in deferred {
            match self.graph.node_state(&reference.node) {
                NodeState::Done(_) => (),
                NodeState::Pending => pending.push(reference.clone()),
                NodeState::Failed(reason) => {
                    return Readiness::Failed {
                        label: reference.label().clone(),
                        reason,
                    };
                }
            }
        }

        if pending.is_empty() {
            Readiness::Ready
        } else {
            Readiness::Pending(pending)
        }
    }

    /// Read the output of a single completed node.
    ///
    /// # Errors
    ///
    /// * [`Error::UnresolvedDependency`] if the node has not completed, this is a scheduling bug.
    /// * [`Error::DependencyFailed`] if evaluating the node failed.
    pub fn extract_label(
        &self,
        setting: &Label,
        deferred: &DeferredNodeRef,
    ) -> Result<ResolvedLabel, Error> {
        match self.graph.node_state(&deferred.node) {
            NodeState::Done(output) => Ok(ResolvedLabel::resolved(deferred.label().clone(), output)),
            NodeState::Pending => {
                tracing::error!(%setting, %deferred, "read a dependency before it completed");
                Err(Error::UnresolvedDependency {
                    setting: setting.clone(),
                    label: deferred.label().clone(),
                })
            }
            NodeState::Failed(reason) => Err(Error::DependencyFailed {
                setting: setting.clone(),
                label: deferred.label().clone(),
                reason,
            }),
        }
    }

    /// Combine the outputs of `deferred` into the value of a setting of type `ty`.
    ///
    /// Fails fast: any failed node fails the whole value, no partial lists are produced.
    ///
    /// # Errors
    ///
    /// * [`Error::DependencyFailed`] if any of the nodes failed.
    /// * [`Error::TypeMismatch`] if `ty` is not a label type, or a `label` setting doesn't have
    ///   exactly one reference.
    pub fn extract_value(
        &self,
        setting: &Label,
        ty: SettingType,
        deferred: &[DeferredNodeRef],
    ) -> Result<ResolvedValue, Error> {
        if let Readiness::Failed { label, reason } = self.poll(deferred) {
            tracing::debug!(%setting, %label, "label dependency failed");
            return Err(Error::DependencyFailed {
                setting: setting.clone(),
                label,
                reason,
            });
        }

        match (ty, deferred) {
            (SettingType::Label, [single]) => {
                Ok(ResolvedValue::Label(self.extract_label(setting, single)?))
            }
            (SettingType::LabelList, refs) => {
                let labels = refs
                    .iter()
                    .map(|reference| self.extract_label(setting, reference))
                    .collect::<Result<_, _>>()?;
                Ok(ResolvedValue::LabelList(labels))
            }
            (ty, refs) => {
                let found = match refs {
                    [_] => SettingType::Label,
                    _ => SettingType::LabelList,
                };
                tracing::error!(%setting, %ty, %found, "extracted label references for wrong type");
                Err(Error::TypeMismatch {
                    setting: setting.clone(),
                    expected: ty,
                    found,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ParsedFlags;
    use crate::graph::InMemoryGraph;
    use crate::value::NodeOutput;

    fn label(text: &str) -> Label {
        Label::parse(text).unwrap()
    }

    fn setup() -> (Arc<InMemoryGraph>, LabelResolver, ConfigurationKey) {
        let graph = Arc::new(InMemoryGraph::new());
        let resolver = LabelResolver::new(Arc::clone(&graph) as Arc<dyn DependencyGraph>);
        let configuration = ConfigurationKey::new("target", ParsedFlags::default());
        (graph, resolver, configuration)
    }

    fn output(path: &str) -> NodeOutput {
        [("path", path)].into_iter().collect()
    }

    #[test]
    fn test_resolve_declares_edge() {
        let (graph, resolver, configuration) = setup();
        let deferred = resolver.resolve(&label("//tc:clang"), &configuration);

        assert_eq!(graph.declarations(deferred.node()), 1);
        assert_eq!(deferred.node().configuration, configuration);
        assert_eq!(
            resolver.poll(std::slice::from_ref(&deferred)),
            Readiness::Pending(smallvec::smallvec![deferred.clone()])
        );

        let other = resolver.resolve(&label("//tc:clang"), &configuration);
        assert_ne!(deferred.id(), other.id());
    }

    #[test]
    fn test_extract_before_completion() {
        let (_graph, resolver, configuration) = setup();
        let deferred = resolver.resolve(&label("//tc:clang"), &configuration);

        let err = resolver
            .extract_label(&label("//s:compiler"), &deferred)
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedDependency { .. }));
        assert!(err.is_internal());
    }

    #[test]
    fn test_extract_single_label() {
        let (graph, resolver, configuration) = setup();
        let deferred = resolver.resolve(&label("//tc:clang"), &configuration);
        graph.complete(label("//tc:clang"), output("/usr/bin/clang"));

        assert_eq!(resolver.poll(std::slice::from_ref(&deferred)), Readiness::Ready);
        let value = resolver
            .extract_value(&label("//s:compiler"), SettingType::Label, &[deferred])
            .unwrap();
        let resolved = value.as_label().unwrap();
        assert_eq!(resolved.label(), &label("//tc:clang"));
        assert_eq!(resolved.output().unwrap().get("path"), Some("/usr/bin/clang"));
    }

    #[test]
    fn test_label_list_fails_fast() {
        let (graph, resolver, configuration) = setup();
        let labels = [label("//p:a"), label("//p:b"), label("//p:c")];
        let deferred = resolver.resolve_all(&labels, &configuration);

        graph.complete(label("//p:a"), output("a"));
        graph.fail(label("//p:b"), "compile error");
        // `//p:c` is still pending, but the failure wins.

        assert!(matches!(
            resolver.poll(&deferred),
            Readiness::Failed { label: failed, .. } if failed == label("//p:b")
        ));
        let err = resolver
            .extract_value(&label("//s:plugins"), SettingType::LabelList, &deferred)
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::DependencyFailed { label: failed, reason, .. }
                if *failed == label("//p:b") && &**reason == "compile error"
        ));
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_label_list_in_order() {
        let (graph, resolver, configuration) = setup();
        let labels = [label("//p:b"), label("//p:a")];
        let deferred = resolver.resolve_all(&labels, &configuration);
        graph.complete(label("//p:a"), output("a"));
        graph.complete(label("//p:b"), output("b"));

        let value = resolver
            .extract_value(&label("//s:plugins"), SettingType::LabelList, &deferred)
            .unwrap();
        let names: Vec<_> = value
            .as_label_list()
            .unwrap()
            .iter()
            .map(|resolved| resolved.label().name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_extract_for_wrong_type() {
        let (graph, resolver, configuration) = setup();
        graph.complete(label("//p:a"), output("a"));
        graph.complete(label("//p:b"), output("b"));
        let refs = resolver.resolve_all(&[label("//p:a"), label("//p:b")], &configuration);
        let setting = label("//s:x");

        let err = resolver
            .extract_value(&setting, SettingType::Label, &refs)
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::TypeMismatch { expected: SettingType::Label, found: SettingType::LabelList, .. }
        ));
        assert!(err.is_internal());

        let err = resolver
            .extract_value(&setting, SettingType::Int, &refs[..1])
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::TypeMismatch { expected: SettingType::Int, found: SettingType::Label, .. }
        ));
        assert!(err.is_internal());
    }
}
