//! Process-wide cache of resolved build setting values.
//!
//! Entries are keyed by `(ConfigurationKey, setting identity)` and are write-once: a configuration
//! is an immutable snapshot, so once a value is committed for it the value never changes. The only
//! way to get rid of a value is to [`invalidate`] the entire configuration.
//!
//! Concurrent first reads of the same entry are single-flight. Exactly one caller claims the
//! entry and computes it, everyone else waits on the entry until the value is committed or the
//! claim is released.
//!
//! [`invalidate`]: SettingValueStore::invalidate

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use pb_types::Label;

use crate::codec::ValueCodec;
use crate::configuration::ConfigurationKey;
use crate::descriptor::BuildSettingDescriptor;
use crate::graph::DependencyGraph;
use crate::resolve::{DeferredNodeRefs, LabelResolver, Readiness};
use crate::value::{Provenance, ResolvedValue};
use crate::Error;

/// How long a waiter sleeps before re-checking for cancellation.
const WAIT_INTERVAL: Duration = Duration::from_millis(50);

/// Context of the configuration evaluation that is reading settings.
///
/// Clones share the cancellation flag, cancelling one cancels them all.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    cancelled: Arc<AtomicBool>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        EvaluationContext::default()
    }

    /// Cancel the evaluation. In-progress reads return [`Error::Cancelled`] without committing.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A committed value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEntry {
    pub value: Arc<ResolvedValue>,
    pub provenance: Provenance,
}

/// Result of reading a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The value is committed.
    Ready(SettingEntry),
    /// The setting depends on labels that haven't been evaluated yet. The caller should yield to
    /// the host scheduler and read the setting again once these nodes complete.
    Pending(DeferredNodeRefs),
}

impl Lookup {
    /// Returns the committed entry, if ready.
    pub fn ready(self) -> Option<SettingEntry> {
        match self {
            Lookup::Ready(entry) => Some(entry),
            Lookup::Pending(_) => None,
        }
    }
}

/// Snapshot of the counters of a [`SettingValueStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Reads that found a committed value.
    pub hits: u64,
    /// Reads that found no committed value, including ones that waited on another caller.
    pub misses: u64,
    /// Number of times a value was computed from a flag or default.
    pub computations: u64,
    /// Number of values committed.
    pub commits: u64,
    /// Computations that returned because a label dependency was pending.
    pub pending: u64,
}

#[derive(Debug, Default)]
struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    commits: AtomicU64,
    pending: AtomicU64,
}

impl StoreCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    /// A caller claimed this slot and is computing its value.
    InFlight,
    Committed(SettingEntry),
}

/// A single `(configuration, setting)` entry.
#[derive(Debug, Default)]
struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

/// Releases a claimed [`Slot`] when dropped, unless a value was committed into it.
struct InFlightGuard<'a> {
    slot: &'a Slot,
}

impl InFlightGuard<'_> {
    fn commit(self, entry: SettingEntry) {
        *self.slot.state.lock() = SlotState::Committed(entry);
        self.slot.ready.notify_all();
        std::mem::forget(self);
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        if matches!(*state, SlotState::InFlight) {
            *state = SlotState::Empty;
        }
        drop(state);
        self.slot.ready.notify_all();
    }
}

/// Slots of a single configuration.
type ConfigurationSlots = DashMap<Label, Arc<Slot>>;

/// Map from `(ConfigurationKey, setting identity)` to resolved value.
///
/// Distinct configurations never contend on the same lock, and the map-level locks are never held
/// while a value is computed.
#[derive(Debug)]
pub struct SettingValueStore {
    configurations: DashMap<ConfigurationKey, Arc<ConfigurationSlots>>,
    codec: ValueCodec,
    resolver: LabelResolver,
    stats: StoreCounters,
}

impl SettingValueStore {
    pub fn new(codec: ValueCodec, graph: Arc<dyn DependencyGraph>) -> Self {
        SettingValueStore {
            configurations: DashMap::new(),
            codec,
            resolver: LabelResolver::new(graph),
            stats: StoreCounters::default(),
        }
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    /// Returns the value of `descriptor` in the configuration `key`, computing and committing it
    /// if this is the first read.
    ///
    /// A flag set on the configuration's command line takes precedence over the declared
    /// default. Label-typed settings return [`Lookup::Pending`] until every label they reference
    /// has been evaluated, nothing is committed in the meantime.
    pub fn get(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
    ) -> Result<Lookup, Error> {
        self.get_cancellable(key, descriptor, &EvaluationContext::default())
    }

    /// Like [`SettingValueStore::get`], but gives up with [`Error::Cancelled`] once `context` is
    /// cancelled.
    pub fn get_cancellable(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
        context: &EvaluationContext,
    ) -> Result<Lookup, Error> {
        let identity = descriptor.identity();
        let cancelled = || Error::Cancelled {
            setting: identity.clone(),
            configuration: key.name().into(),
        };
        if context.is_cancelled() {
            return Err(cancelled());
        }

        let slot = self.slot(key, identity);
        let mut state = slot.state.lock();
        let mut waited = false;
        loop {
            if let SlotState::Committed(entry) = &*state {
                if !waited {
                    StoreCounters::bump(&self.stats.hits);
                    tracing::trace!(setting = %identity, config = %key, "setting cache hit");
                }
                return Ok(Lookup::Ready(entry.clone()));
            }
            if !waited {
                StoreCounters::bump(&self.stats.misses);
                waited = true;
            }
            if !matches!(*state, SlotState::InFlight) {
                break;
            }
            if context.is_cancelled() {
                return Err(cancelled());
            }
            slot.ready.wait_for(&mut state, WAIT_INTERVAL);
        }

        // We own the computation now.
        *state = SlotState::InFlight;
        drop(state);
        let guard = InFlightGuard { slot: &slot };

        StoreCounters::bump(&self.stats.computations);
        let (value, provenance) = match self.compute(key, descriptor)? {
            Computed::Ready(value, provenance) => (value, provenance),
            Computed::Pending(pending) => {
                StoreCounters::bump(&self.stats.pending);
                tracing::debug!(
                    setting = %identity,
                    config = %key,
                    pending = pending.len(),
                    "setting waiting on label dependencies",
                );
                return Ok(Lookup::Pending(pending));
            }
        };

        if context.is_cancelled() {
            tracing::debug!(setting = %identity, config = %key, "dropping value of cancelled evaluation");
            return Err(cancelled());
        }

        let entry = SettingEntry {
            value: Arc::new(value),
            provenance,
        };
        guard.commit(entry.clone());
        StoreCounters::bump(&self.stats.commits);
        tracing::debug!(
            setting = %identity,
            config = %key,
            value = %entry.value,
            %provenance,
            "committed setting",
        );

        Ok(Lookup::Ready(entry))
    }

    /// Commit `value` for `descriptor` in the configuration `key`.
    ///
    /// Committing a value equal to the one already committed is a no-op that returns the existing
    /// entry.
    ///
    /// # Errors
    ///
    /// * [`Error::TypeMismatch`] if `value` is not of the descriptor's type.
    /// * [`Error::SettingValueConflict`] if a different value is already committed.
    pub fn commit(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
        value: ResolvedValue,
        provenance: Provenance,
    ) -> Result<SettingEntry, Error> {
        self.commit_shared(key, descriptor, Arc::new(value), provenance)
    }

    /// Copy the value of `descriptor` committed in `from` into `to`, e.g. across a configuration
    /// transition that doesn't change the setting. The copy has [`Provenance::Inherited`].
    ///
    /// Returns `None` if nothing is committed in `from`.
    pub fn inherit(
        &self,
        from: &ConfigurationKey,
        to: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
    ) -> Result<Option<SettingEntry>, Error> {
        let Some(source) = self.peek(from, descriptor.identity()) else {
            return Ok(None);
        };
        self.commit_shared(to, descriptor, source.value, Provenance::Inherited)
            .map(Some)
    }

    /// Returns the committed entry for `identity` in `key`, without computing anything.
    pub fn peek(&self, key: &ConfigurationKey, identity: &Label) -> Option<SettingEntry> {
        let slots = self.configurations.get(key)?.value().clone();
        let slot = slots.get(identity)?.value().clone();
        let state = slot.state.lock();
        match &*state {
            SlotState::Committed(entry) => Some(entry.clone()),
            SlotState::Empty | SlotState::InFlight => None,
        }
    }

    /// Drop every entry of the configuration `key`. Returns if anything was dropped.
    ///
    /// Subsequent reads recompute from scratch. Computations that are in flight finish into the
    /// dropped entries and are never observed.
    pub fn invalidate(&self, key: &ConfigurationKey) -> bool {
        let dropped = self.configurations.remove(key);
        if let Some((_, slots)) = &dropped {
            tracing::debug!(config = %key, entries = slots.len(), "invalidated configuration");
        }
        dropped.is_some()
    }

    pub fn stats(&self) -> StoreStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StoreStats {
            hits: load(&self.stats.hits),
            misses: load(&self.stats.misses),
            computations: load(&self.stats.computations),
            commits: load(&self.stats.commits),
            pending: load(&self.stats.pending),
        }
    }

    fn slot(&self, key: &ConfigurationKey, identity: &Label) -> Arc<Slot> {
        let slots = Arc::clone(self.configurations.entry(key.clone()).or_default().value());
        // Bound so the entry guard is dropped before `slots`.
        let slot = Arc::clone(slots.entry(identity.clone()).or_default().value());
        slot
    }

    fn commit_shared(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
        value: Arc<ResolvedValue>,
        provenance: Provenance,
    ) -> Result<SettingEntry, Error> {
        let identity = descriptor.identity();
        let expected = descriptor.setting_type();
        let found = value.setting_type();
        if expected != found {
            return Err(Error::TypeMismatch {
                setting: identity.clone(),
                expected,
                found,
            });
        }

        let slot = self.slot(key, identity);
        let mut state = slot.state.lock();
        while matches!(*state, SlotState::InFlight) {
            slot.ready.wait(&mut state);
        }

        if let SlotState::Committed(existing) = &*state {
            if *existing.value == *value {
                return Ok(existing.clone());
            }
            tracing::error!(
                setting = %identity,
                config = %key,
                committed = %existing.value,
                attempted = %value,
                "conflicting commit of a build setting",
            );
            return Err(Error::SettingValueConflict {
                setting: identity.clone(),
                configuration: key.name().into(),
                committed: Box::new(ResolvedValue::clone(&existing.value)),
                attempted: Box::new(ResolvedValue::clone(&value)),
            });
        }

        let entry = SettingEntry { value, provenance };
        *state = SlotState::Committed(entry.clone());
        drop(state);
        slot.ready.notify_all();

        StoreCounters::bump(&self.stats.commits);
        tracing::debug!(setting = %identity, config = %key, %provenance, "committed setting");

        Ok(entry)
    }

    /// Compute the value of `descriptor` from the configuration's flags or the default.
    fn compute(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
    ) -> Result<Computed, Error> {
        let identity = descriptor.identity();
        let ty = descriptor.setting_type();

        let (raw, provenance) = match key.flags().get(identity) {
            Some(raw) if descriptor.is_flag() => (raw, Provenance::ExplicitFlag),
            _ => (descriptor.default_value(), Provenance::ExplicitDefault),
        };
        let value = self
            .codec
            .parse(ty, raw)
            .map_err(|err| Error::from_parse(identity, err))?;

        let labels = match &value {
            ResolvedValue::Label(label) => vec![label.label()],
            ResolvedValue::LabelList(labels) => labels.iter().map(|l| l.label()).collect(),
            _ => return Ok(Computed::Ready(value, provenance)),
        };
        let deferred = self.resolver.resolve_all(labels, key);
        if let Readiness::Pending(pending) = self.resolver.poll(&deferred) {
            return Ok(Computed::Pending(pending));
        }
        let value = self.resolver.extract_value(identity, ty, &deferred)?;

        Ok(Computed::Ready(value, provenance))
    }
}

enum Computed {
    Ready(ResolvedValue, Provenance),
    Pending(DeferredNodeRefs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DeclaringScope;
    use crate::flags::{FlagBindingTable, ParsedFlags};
    use crate::graph::{InMemoryGraph, NodeKey, NodeState};
    use crate::value::NodeOutput;

    fn label(text: &str) -> Label {
        Label::parse(text).unwrap()
    }

    fn store() -> (Arc<InMemoryGraph>, SettingValueStore) {
        let graph = Arc::new(InMemoryGraph::new());
        let store = SettingValueStore::new(ValueCodec::default(), Arc::clone(&graph) as _);
        (graph, store)
    }

    #[test]
    fn test_default_then_hit() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let opt = scope.declare(label("//cc:opt"), "2").int(true).unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let first = store.get(&key, &opt).unwrap().ready().unwrap();
        assert_eq!(first.value.as_int(), Some(2));
        assert_eq!(first.provenance, Provenance::ExplicitDefault);

        let second = store.get(&key, &opt).unwrap().ready().unwrap();
        assert!(Arc::ptr_eq(&first.value, &second.value));
        assert_eq!(
            store.stats(),
            StoreStats {
                hits: 1,
                misses: 1,
                computations: 1,
                commits: 1,
                pending: 0,
            }
        );
    }

    #[test]
    fn test_non_flag_ignores_command_line() {
        let (_graph, store) = store();
        let table = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&table);
        let flag = scope.declare(label("//s:x"), "1").int(true).unwrap();
        let flags = table.parse_command_line(&["--//s:x=5"]).unwrap().flags;

        // Same identity, but declared as a plain setting in another scope.
        let other_table = FlagBindingTable::default();
        let mut other_scope = DeclaringScope::new(&other_table);
        let plain = other_scope.declare(label("//s:x"), "1").int(false).unwrap();

        let key = ConfigurationKey::new("target", flags);
        let flag_entry = store.get(&key, &flag).unwrap().ready().unwrap();
        assert_eq!(flag_entry.value.as_int(), Some(5));
        assert_eq!(flag_entry.provenance, Provenance::ExplicitFlag);

        let key = ConfigurationKey::new("exec", key.flags().clone());
        let plain_entry = store.get(&key, &plain).unwrap().ready().unwrap();
        assert_eq!(plain_entry.value.as_int(), Some(1));
        assert_eq!(plain_entry.provenance, Provenance::ExplicitDefault);
    }

    #[test]
    fn test_invalid_default_is_not_committed() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let bad = scope.declare(label("//s:bad"), "maybe").bool(false).unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let err = store.get(&key, &bad).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref literal, .. } if literal == "maybe"));
        assert!(store.peek(&key, bad.identity()).is_none());

        // The claim was released, so the next read computes again.
        assert!(store.get(&key, &bad).is_err());
        assert_eq!(store.stats().computations, 2);
    }

    #[test]
    fn test_pending_label_then_ready() {
        let (graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let compiler = scope
            .declare(label("//s:compiler"), "//tc:clang")
            .label(false)
            .unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let Lookup::Pending(pending) = store.get(&key, &compiler).unwrap() else {
            panic!("expected pending lookup");
        };
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].label(), &label("//tc:clang"));
        assert!(store.peek(&key, compiler.identity()).is_none());

        let output: NodeOutput = [("path", "/usr/bin/clang")].into_iter().collect();
        graph.complete(label("//tc:clang"), output.clone());

        let entry = store.get(&key, &compiler).unwrap().ready().unwrap();
        assert_eq!(entry.value.as_label().unwrap().output(), Some(&output));
        assert_eq!(store.stats().pending, 1);
        assert_eq!(store.stats().commits, 1);
    }

    #[test]
    fn test_cancelled_before_commit() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let name = scope.declare(label("//s:name"), "pb").string(false).unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let context = EvaluationContext::new();
        context.clone().cancel();
        let err = store.get_cancellable(&key, &name, &context).unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert!(store.peek(&key, name.identity()).is_none());
        assert_eq!(store.stats().commits, 0);
    }

    #[test]
    fn test_commit_write_once() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let jobs = scope.declare(label("//s:jobs"), "4").int(false).unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        store
            .commit(&key, &jobs, ResolvedValue::Int(8), Provenance::ExplicitFlag)
            .unwrap();
        let again = store
            .commit(&key, &jobs, ResolvedValue::Int(8), Provenance::ExplicitFlag)
            .unwrap();
        assert_eq!(again.value.as_int(), Some(8));

        let err = store
            .commit(&key, &jobs, ResolvedValue::Int(16), Provenance::ExplicitFlag)
            .unwrap_err();
        assert!(matches!(err, Error::SettingValueConflict { .. }));
        assert!(err.is_internal());

        let err = store
            .commit(&key, &jobs, ResolvedValue::Bool(true), Provenance::ExplicitFlag)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        // `get` sees the committed value instead of the default.
        let entry = store.get(&key, &jobs).unwrap().ready().unwrap();
        assert_eq!(entry.value.as_int(), Some(8));
    }

    #[test]
    fn test_inherit() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let jobs = scope.declare(label("//s:jobs"), "4").int(false).unwrap();
        let target = ConfigurationKey::new("target", ParsedFlags::default());
        let exec = ConfigurationKey::new("exec", ParsedFlags::default());

        assert_eq!(store.inherit(&target, &exec, &jobs).unwrap(), None);

        store.get(&target, &jobs).unwrap();
        let inherited = store.inherit(&target, &exec, &jobs).unwrap().unwrap();
        assert_eq!(inherited.provenance, Provenance::Inherited);
        assert_eq!(inherited.value.as_int(), Some(4));

        let entry = store.get(&exec, &jobs).unwrap().ready().unwrap();
        assert_eq!(entry.provenance, Provenance::Inherited);
    }

    #[test]
    fn test_invalidate() {
        let (_graph, store) = store();
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);
        let jobs = scope.declare(label("//s:jobs"), "4").int(false).unwrap();
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let before = store.get(&key, &jobs).unwrap().ready().unwrap();
        assert!(store.invalidate(&key));
        assert!(!store.invalidate(&key));
        assert!(store.peek(&key, jobs.identity()).is_none());

        let after = store.get(&key, &jobs).unwrap().ready().unwrap();
        assert_eq!(before, after);
        assert!(!Arc::ptr_eq(&before.value, &after.value));
        assert_eq!(store.stats().computations, 2);
    }

    /// Every target is done, `on_state` runs whenever the state of a node is read.
    struct HookedGraph<F> {
        on_state: F,
    }

    impl<F: Fn() + Send + Sync> DependencyGraph for HookedGraph<F> {
        fn declare_dependency(&self, _node: &NodeKey) {}

        fn node_state(&self, _node: &NodeKey) -> NodeState {
            (self.on_state)();
            NodeState::Done(NodeOutput::default())
        }
    }

    fn compiler_setting(flags: &FlagBindingTable) -> BuildSettingDescriptor {
        DeclaringScope::new(flags)
            .declare(label("//s:compiler"), "//tc:clang")
            .label(false)
            .unwrap()
    }

    #[test]
    fn test_cancelled_while_computing() {
        let context = EvaluationContext::new();
        let cancel = context.clone();
        let graph = HookedGraph {
            on_state: move || cancel.cancel(),
        };
        let store = SettingValueStore::new(ValueCodec::default(), Arc::new(graph));
        let flags = FlagBindingTable::default();
        let compiler = compiler_setting(&flags);
        let key = ConfigurationKey::new("target", ParsedFlags::default());

        let err = store.get_cancellable(&key, &compiler, &context).unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert!(store.peek(&key, compiler.identity()).is_none());
        assert_eq!(store.stats().computations, 1);
        assert_eq!(store.stats().commits, 0);

        // The claim was released, another evaluation computes the value.
        let entry = store.get(&key, &compiler).unwrap().ready().unwrap();
        assert_eq!(entry.value.as_label().unwrap().label(), &label("//tc:clang"));
    }

    #[test]
    fn test_cancelled_while_waiting() {
        let entered = Arc::new(std::sync::Barrier::new(2));
        let release = Arc::new(std::sync::Barrier::new(2));
        let first_read = AtomicBool::new(true);
        let graph = HookedGraph {
            on_state: {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                move || {
                    // Hold the first computation open until the test releases it.
                    if first_read.swap(false, Ordering::SeqCst) {
                        entered.wait();
                        release.wait();
                    }
                }
            },
        };
        let store = SettingValueStore::new(ValueCodec::default(), Arc::new(graph));
        let flags = FlagBindingTable::default();
        let compiler = compiler_setting(&flags);
        let key = ConfigurationKey::new("target", ParsedFlags::default());
        let context = EvaluationContext::new();

        std::thread::scope(|s| {
            let owner = s.spawn(|| store.get(&key, &compiler));
            entered.wait();

            let waiter = s.spawn(|| store.get_cancellable(&key, &compiler, &context));
            while store.stats().misses < 2 {
                std::thread::yield_now();
            }
            context.cancel();
            let err = waiter.join().unwrap().unwrap_err();
            assert!(matches!(err, Error::Cancelled { .. }));

            release.wait();
            let entry = owner.join().unwrap().unwrap().ready().unwrap();
            assert_eq!(store.peek(&key, compiler.identity()), Some(entry));
        });
        assert_eq!(store.stats().computations, 1);
    }
}
