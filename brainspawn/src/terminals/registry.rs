//! Live terminal sessions, grouped by the spawn group that created them.

use tracing::{debug, info};

use crate::core::types::GroupKey;
use crate::host::{TerminalHandle, TerminalId};
use crate::store::ListenerId;

/// What changed in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Tracked { key: GroupKey, id: TerminalId },
    Closed { key: GroupKey, id: TerminalId },
    Killed { key: GroupKey, count: usize },
}

type Listener = Box<dyn FnMut(&RegistryEvent) + Send>;

/// Ordered map from group identity to the sessions it owns.
///
/// A group is "running" while it has at least one tracked session; empty
/// groups are removed eagerly.
#[derive(Default)]
pub struct TerminalRegistry {
    groups: Vec<(GroupKey, Vec<Box<dyn TerminalHandle>>)>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for TerminalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups: Vec<(&GroupKey, usize)> = self
            .groups
            .iter()
            .map(|(key, handles)| (key, handles.len()))
            .collect();
        f.debug_struct("TerminalRegistry")
            .field("groups", &groups)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, key: GroupKey, handle: Box<dyn TerminalHandle>) {
        let id = handle.id();
        match self.groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, handles)) => handles.push(handle),
            None => self.groups.push((key.clone(), vec![handle])),
        }
        debug!(group = %key, id, "tracking terminal");
        self.notify(&RegistryEvent::Tracked { key, id });
    }

    /// Forget a session the host reports as closed. Unknown ids are ignored.
    pub fn handle_closed(&mut self, id: TerminalId) {
        let Some(group_index) = self
            .groups
            .iter()
            .position(|(_, handles)| handles.iter().any(|handle| handle.id() == id))
        else {
            return;
        };

        let (key, handles) = &mut self.groups[group_index];
        let key = key.clone();
        handles.retain(|handle| handle.id() != id);
        if handles.is_empty() {
            self.groups.remove(group_index);
        }
        debug!(group = %key, id, "terminal closed");
        self.notify(&RegistryEvent::Closed { key, id });
    }

    /// Dispose every session of a group. No-op when nothing is tracked.
    pub fn kill_group(&mut self, key: &GroupKey) {
        let Some(group_index) = self.groups.iter().position(|(existing, _)| existing == key) else {
            return;
        };
        let (key, handles) = self.groups.remove(group_index);
        for handle in &handles {
            handle.dispose();
        }
        info!(group = %key, count = handles.len(), "killed group");
        self.notify(&RegistryEvent::Killed {
            key,
            count: handles.len(),
        });
    }

    pub fn is_group_running(&self, key: &GroupKey) -> bool {
        self.handles(key).is_some_and(|handles| !handles.is_empty())
    }

    /// Ids of the sessions tracked for `key`, in launch order.
    pub fn group_terminals(&self, key: &GroupKey) -> Vec<TerminalId> {
        self.handles(key)
            .map(|handles| handles.iter().map(|handle| handle.id()).collect())
            .unwrap_or_default()
    }

    /// Running groups with their session counts, in first-launch order.
    pub fn running_groups(&self) -> Vec<(GroupKey, usize)> {
        self.groups
            .iter()
            .map(|(key, handles)| (key.clone(), handles.len()))
            .collect()
    }

    pub fn running_group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(key, _)| key.name.clone()).collect()
    }

    pub fn active_terminal_count(&self) -> usize {
        self.groups.iter().map(|(_, handles)| handles.len()).sum()
    }

    /// Foreground one tracked session. Returns `false` for unknown ids.
    pub fn show(&self, id: TerminalId) -> bool {
        let handle = self
            .groups
            .iter()
            .flat_map(|(_, handles)| handles.iter())
            .find(|handle| handle.id() == id);
        match handle {
            Some(handle) => {
                handle.show();
                true
            }
            None => false,
        }
    }

    pub fn on_change(
        &mut self,
        listener: impl FnMut(&RegistryEvent) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn handles(&self, key: &GroupKey) -> Option<&[Box<dyn TerminalHandle>]> {
        self.groups
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, handles)| handles.as_slice())
    }

    fn notify(&mut self, event: &RegistryEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::launch_plan::TerminalOptions;
    use crate::core::types::GroupSource;
    use crate::host::TerminalHost;
    use crate::test_support::FakeTerminalHost;

    fn open(host: &mut FakeTerminalHost, name: &str) -> Box<dyn TerminalHandle> {
        host.create(TerminalOptions {
            name: name.to_string(),
            icon_id: "terminal".to_string(),
            color_id: None,
            cwd: None,
            env: None,
        })
        .expect("create")
    }

    fn key(name: &str, source: GroupSource) -> GroupKey {
        GroupKey::new(name, Some(source))
    }

    #[test]
    fn same_name_in_different_scopes_is_tracked_separately() {
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        let workspace = key("dev", GroupSource::Workspace);
        let user = key("dev", GroupSource::User);

        registry.track(workspace.clone(), open(&mut host, "a"));
        registry.track(user.clone(), open(&mut host, "b"));
        registry.track(user.clone(), open(&mut host, "c"));

        assert_eq!(registry.group_terminals(&workspace), vec![1]);
        assert_eq!(registry.group_terminals(&user), vec![2, 3]);
        assert_eq!(registry.active_terminal_count(), 3);

        registry.kill_group(&user);
        assert!(registry.is_group_running(&workspace));
        assert!(!registry.is_group_running(&user));
        assert_eq!(host.disposed(), vec![2, 3]);
    }

    #[test]
    fn closing_last_terminal_drops_the_group() {
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        let dev = key("dev", GroupSource::Workspace);
        registry.track(dev.clone(), open(&mut host, "a"));
        registry.track(dev.clone(), open(&mut host, "b"));

        registry.handle_closed(1);
        assert_eq!(registry.group_terminals(&dev), vec![2]);
        registry.handle_closed(2);
        assert!(!registry.is_group_running(&dev));
        assert!(registry.running_group_names().is_empty());
        assert!(host.disposed().is_empty(), "closure is not disposal");
    }

    #[test]
    fn unknown_ids_and_groups_are_ignored() {
        let mut registry = TerminalRegistry::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        registry.on_change(move |event| seen.lock().expect("lock").push(event.clone()));

        registry.handle_closed(42);
        registry.kill_group(&key("ghost", GroupSource::User));
        assert!(events.lock().expect("lock").is_empty());
    }

    #[test]
    fn listeners_see_every_change_until_unsubscribed() {
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        let id = registry.on_change(move |event| seen.lock().expect("lock").push(event.clone()));
        let dev = key("dev", GroupSource::Workspace);

        registry.track(dev.clone(), open(&mut host, "a"));
        registry.kill_group(&dev);
        assert!(registry.unsubscribe(id));
        registry.track(dev.clone(), open(&mut host, "b"));

        assert_eq!(
            *events.lock().expect("lock"),
            vec![
                RegistryEvent::Tracked {
                    key: dev.clone(),
                    id: 1
                },
                RegistryEvent::Killed { key: dev, count: 1 },
            ]
        );
    }

    #[test]
    fn running_groups_keep_first_launch_order() {
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        registry.track(key("b", GroupSource::User), open(&mut host, "1"));
        registry.track(key("a", GroupSource::Workspace), open(&mut host, "2"));
        registry.track(key("b", GroupSource::User), open(&mut host, "3"));

        assert_eq!(registry.running_group_names(), vec!["b", "a"]);
        assert_eq!(
            registry.running_groups(),
            vec![
                (key("b", GroupSource::User), 2),
                (key("a", GroupSource::Workspace), 1),
            ]
        );
    }
}
