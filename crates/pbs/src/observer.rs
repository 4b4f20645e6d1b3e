//! Change notification fan-out

use pbs_api::ModelChanges;

/// Receives committed model changes.
///
/// Called synchronously after a commit, an undo or a redo; never for aborted
/// transactions. Every method defaults to doing nothing.
pub trait ModelObserver {
    fn on_tags_changed(&mut self, _changes: &ModelChanges) {}

    fn on_shortcuts_changed(&mut self, _changes: &ModelChanges) {}

    /// Label of the transaction now on top of the undo stack
    fn on_undo_stack_changed(&mut self, _next_undo: Option<&str>) {}

    fn on_redo_stack_changed(&mut self, _next_redo: Option<&str>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<(ObserverId, Box<dyn ModelObserver>)>,
    next_id: u64,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn ModelObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns the observer if it was registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn ModelObserver>> {
        let pos = self.observers.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `changes` followed by the new stack tops.
    pub fn notify(&mut self, changes: &ModelChanges, next_undo: Option<&str>, next_redo: Option<&str>) {
        for (_, observer) in &mut self.observers {
            if !changes.tags.is_empty() {
                observer.on_tags_changed(changes);
            }
            if !changes.shortcuts.is_empty() {
                observer.on_shortcuts_changed(changes);
            }
            observer.on_undo_stack_changed(next_undo);
            observer.on_redo_stack_changed(next_redo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbs_api::{Change, ChangeOrigin, TagId};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl ModelObserver for Recorder {
        fn on_tags_changed(&mut self, changes: &ModelChanges) {
            self.0.borrow_mut().push(format!("tags {}", changes.tags.len()));
        }

        fn on_undo_stack_changed(&mut self, next_undo: Option<&str>) {
            self.0
                .borrow_mut()
                .push(format!("undo {}", next_undo.unwrap_or("-")));
        }
    }

    #[test]
    fn test_notify_skips_empty_kinds() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ObserverSet::new();
        set.subscribe(Box::new(Recorder(log.clone())));

        let mut changes = ModelChanges::new(ChangeOrigin::Local, "Create Tag");
        changes.record_tag(Change::Created { id: TagId(1) });
        set.notify(&changes, Some("Create Tag"), None);

        assert_eq!(*log.borrow(), vec!["tags 1", "undo Create Tag"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ObserverSet::new();
        let id = set.subscribe(Box::new(Recorder(log.clone())));
        assert!(set.unsubscribe(id).is_some());
        assert!(set.unsubscribe(id).is_none());

        set.notify(&ModelChanges::new(ChangeOrigin::Undo, "x"), None, None);
        assert!(log.borrow().is_empty());
        assert!(set.is_empty());
    }
}
