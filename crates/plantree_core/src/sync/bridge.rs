//! Two-way bridge between the tree store and the timeline widget.
//!
//! # Responsibility
//! - Translate widget events into store mutations.
//! - Push a fresh `{tasks, links}` feed when the store changed elsewhere.
//!
//! # Invariants
//! - State is `Idle` between calls; `Syncing(origin)` only while one side's
//!   synchronous effects run.
//! - Events arriving while not `Idle` are dropped and counted, never applied.
//! - A widget add never duplicates an id the store already holds; the added
//!   node starts collapsed.
//! - Open/close on an up-to-date widget never causes a push.

use crate::config::PlanConfig;
use crate::model::node::{NodeId, ROOT_ID};
use crate::projection::schedule::aggregate;
use crate::store::tree_store::{TreeStore, TreeStoreError};
use crate::sync::widget::{timeline_snapshot, TimelineWidget, WidgetEvent, WidgetTask};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which side started the sync in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOrigin {
    Widget,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing(SyncOrigin),
}

impl SyncState {
    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing(SyncOrigin::Widget) => "syncing_widget",
            Self::Syncing(SyncOrigin::Store) => "syncing_store",
        }
    }
}

/// What one widget event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// Valid event with nothing to change (duplicate add, unknown id,
    /// redundant open/close).
    Unchanged,
    /// Dropped because another sync was in flight.
    Suppressed,
}

/// Result of [`SyncBridge::store_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The widget already reflects this revision.
    UpToDate,
    Pushed {
        revision: u64,
        tasks: usize,
        /// Echo events raised by the widget during the reload.
        suppressed: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The store rejected a structural widget edit.
    Store(TreeStoreError),
    /// `store_changed` was called while another sync was in flight.
    Busy(SyncOrigin),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "widget edit rejected: {err}"),
            Self::Busy(origin) => write!(f, "sync already in flight from {origin:?}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Busy(_) => None,
        }
    }
}

impl From<TreeStoreError> for SyncError {
    fn from(value: TreeStoreError) -> Self {
        Self::Store(value)
    }
}

/// Explicit `Idle -> Syncing(origin) -> Idle` state machine around one widget.
#[derive(Debug)]
pub struct SyncBridge<W: TimelineWidget> {
    widget: W,
    state: SyncState,
    synced_revision: Option<u64>,
    suppressed: usize,
}

impl<W: TimelineWidget> SyncBridge<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            state: SyncState::Idle,
            synced_revision: None,
            suppressed: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Store revision the widget is known to reflect.
    pub fn synced_revision(&self) -> Option<u64> {
        self.synced_revision
    }

    /// Total events dropped by the suppression guard.
    pub fn suppressed_events(&self) -> usize {
        self.suppressed
    }

    /// Applies one widget-originated event to `store`.
    ///
    /// # Errors
    /// - `SyncError::Store` when the widget deletes the root or adds under a
    ///   parent the store does not know.
    pub fn handle_widget_event(
        &mut self,
        store: &mut TreeStore,
        event: WidgetEvent,
    ) -> Result<SyncOutcome, SyncError> {
        if self.state != SyncState::Idle {
            self.suppressed += 1;
            debug!(
                "event=widget_sync module=sync status=skipped kind={} id={} state={}",
                event.kind(),
                event.task_id(),
                self.state.label()
            );
            return Ok(SyncOutcome::Suppressed);
        }

        let kind = event.kind();
        let id = event.task_id().to_string();
        let view_only = matches!(
            event,
            WidgetEvent::TaskOpened { .. } | WidgetEvent::TaskClosed { .. }
        );
        let widget_was_current = self.synced_revision == Some(store.revision());
        self.state = SyncState::Syncing(SyncOrigin::Widget);
        let result = apply_event(store, event);
        self.state = SyncState::Idle;

        match &result {
            Ok(outcome) => {
                if *outcome == SyncOutcome::Applied && view_only && widget_was_current {
                    self.synced_revision = Some(store.revision());
                }
                info!(
                    "event=widget_sync module=sync status=ok kind={} id={} outcome={:?} revision={}",
                    kind,
                    id,
                    outcome,
                    store.revision()
                );
            }
            Err(err) => {
                warn!(
                    "event=widget_sync module=sync status=error kind={} id={} error={}",
                    kind, id, err
                );
            }
        }
        result
    }

    /// Pushes the full feed if the store moved past the synced revision.
    ///
    /// Events the widget raises while reloading are suppressed.
    pub fn store_changed(
        &mut self,
        store: &TreeStore,
        config: &PlanConfig,
    ) -> Result<PushOutcome, SyncError> {
        if let SyncState::Syncing(origin) = self.state {
            return Err(SyncError::Busy(origin));
        }
        let revision = store.revision();
        if self.synced_revision == Some(revision) {
            return Ok(PushOutcome::UpToDate);
        }

        let tree = store.tree();
        let feed = timeline_snapshot(
            tree,
            store.collapsed(),
            &aggregate(tree),
            &config.schedule,
        );

        self.state = SyncState::Syncing(SyncOrigin::Store);
        let echoes = self.widget.replace_all(&feed);
        let suppressed = echoes.len();
        for echo in &echoes {
            self.suppress_echo(echo);
        }
        self.state = SyncState::Idle;
        self.synced_revision = Some(revision);

        info!(
            "event=widget_push module=sync status=ok revision={} tasks={} links={} suppressed={}",
            revision,
            feed.tasks.len(),
            feed.links.len(),
            suppressed
        );
        Ok(PushOutcome::Pushed {
            revision,
            tasks: feed.tasks.len(),
            suppressed,
        })
    }

    fn suppress_echo(&mut self, echo: &WidgetEvent) {
        self.suppressed += 1;
        debug!(
            "event=widget_sync module=sync status=skipped kind={} id={} state={}",
            echo.kind(),
            echo.task_id(),
            self.state.label()
        );
    }
}

fn apply_event(store: &mut TreeStore, event: WidgetEvent) -> Result<SyncOutcome, SyncError> {
    match event {
        WidgetEvent::TaskAdded(task) => add_task(store, &task),
        WidgetEvent::TaskDeleted { id } => delete_task(store, &id),
        WidgetEvent::TaskUpdated(task) => Ok(outcome(store.update_node(&task.id, &task.to_patch()))),
        WidgetEvent::TaskOpened { id } => Ok(outcome(store.set_collapsed(&id, false))),
        WidgetEvent::TaskClosed { id } => Ok(outcome(store.set_collapsed(&id, true))),
    }
}

fn add_task(store: &mut TreeStore, task: &WidgetTask) -> Result<SyncOutcome, SyncError> {
    if store.contains(&task.id) {
        return Ok(SyncOutcome::Unchanged);
    }
    store.add_child_with_id(task.parent.node_id(), task.id.clone(), task.to_patch())?;
    store.set_collapsed(&task.id, true);
    Ok(SyncOutcome::Applied)
}

fn delete_task(store: &mut TreeStore, id: &NodeId) -> Result<SyncOutcome, SyncError> {
    if !store.contains(id) && id.as_str() != ROOT_ID {
        return Ok(SyncOutcome::Unchanged);
    }
    store.delete_subtree(id)?;
    Ok(SyncOutcome::Applied)
}

fn outcome(changed: bool) -> SyncOutcome {
    if changed {
        SyncOutcome::Applied
    } else {
        SyncOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::{PushOutcome, SyncBridge, SyncError, SyncOutcome, SyncState};
    use crate::config::PlanConfig;
    use crate::model::node::{Node, NodePatch, ROOT_ID};
    use crate::store::tree_store::{TreeStore, TreeStoreError};
    use crate::sync::widget::{MemoryWidget, ParentRef, WidgetEvent, WidgetTask};

    fn task(id: &str, parent: ParentRef) -> WidgetTask {
        WidgetTask {
            id: id.to_string(),
            text: "From widget".to_string(),
            start_date: "01-09-2025".to_string(),
            duration: 4,
            parent,
            progress: 0.25,
            open: true,
        }
    }

    #[test]
    fn widget_add_maps_parent_zero_to_root_and_computes_required_date() {
        let mut store = TreeStore::new(Node::root("Programme"));
        let mut bridge = SyncBridge::new(MemoryWidget::new());

        let outcome = bridge
            .handle_widget_event(&mut store, WidgetEvent::TaskAdded(task("w1", ParentRef::Root)))
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Applied);
        let node = store.node("w1").unwrap();
        assert_eq!(node.parent.as_deref(), Some(ROOT_ID));
        assert_eq!(node.date_required.as_deref(), Some("05-09-2025"));
        assert_eq!(store.tree().children_of(ROOT_ID), ["w1".to_string()]);
        assert!(store.collapsed().contains("w1"));
        assert_eq!(bridge.state(), SyncState::Idle);
    }

    #[test]
    fn duplicate_widget_add_is_ignored() {
        let mut store = TreeStore::new(Node::root("Programme"));
        let mut bridge = SyncBridge::new(MemoryWidget::new());
        let event = WidgetEvent::TaskAdded(task("w1", ParentRef::Root));

        bridge.handle_widget_event(&mut store, event.clone()).unwrap();
        let revision = store.revision();
        let second = bridge.handle_widget_event(&mut store, event).unwrap();

        assert_eq!(second, SyncOutcome::Unchanged);
        assert_eq!(store.revision(), revision);
        assert_eq!(store.tree().children_of(ROOT_ID).len(), 1);
    }

    #[test]
    fn widget_delete_of_root_is_rejected_and_unknown_id_ignored() {
        let mut store = TreeStore::new(Node::root("Programme"));
        let mut bridge = SyncBridge::new(MemoryWidget::new());

        let err = bridge
            .handle_widget_event(
                &mut store,
                WidgetEvent::TaskDeleted {
                    id: ROOT_ID.to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err, SyncError::Store(TreeStoreError::CannotDeleteRoot));

        let outcome = bridge
            .handle_widget_event(
                &mut store,
                WidgetEvent::TaskDeleted {
                    id: "ghost".to_string(),
                },
            )
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged);
    }

    #[test]
    fn open_close_does_not_trigger_push() {
        let mut store = TreeStore::new(Node::root("Programme"));
        let category = store.add_child(ROOT_ID, NodePatch::label("Coal")).unwrap();
        let config = PlanConfig::default();
        let mut bridge = SyncBridge::new(MemoryWidget::new());
        bridge.store_changed(&store, &config).unwrap();

        bridge
            .handle_widget_event(&mut store, WidgetEvent::TaskClosed { id: category.clone() })
            .unwrap();

        assert!(store.collapsed().contains(&category));
        assert_eq!(
            bridge.store_changed(&store, &config).unwrap(),
            PushOutcome::UpToDate
        );
        assert_eq!(bridge.widget().loads, 1);
    }

    #[test]
    fn push_suppresses_widget_echoes() {
        let mut store = TreeStore::new(Node::root("Programme"));
        store.add_child(ROOT_ID, NodePatch::label("Coal")).unwrap();
        let mut bridge = SyncBridge::new(MemoryWidget::echoing());

        let pushed = bridge
            .store_changed(&store, &PlanConfig::default())
            .unwrap();

        assert_eq!(
            pushed,
            PushOutcome::Pushed {
                revision: store.revision(),
                tasks: 2,
                suppressed: 2,
            }
        );
        assert_eq!(bridge.suppressed_events(), 2);
        assert_eq!(bridge.state(), SyncState::Idle);
        assert!(store.collapsed().is_empty());
    }
}
