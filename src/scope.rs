//! Scope - explicitly injected resolution context (v0.1)
//!
//! Replaces the ambient global namespace: a shared map of named roots that
//! paths resolve against, plus a registry of named notification callbacks.
//! Cloning a scope clones the handle, not the data.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::node::Node;
use crate::panel::Notification;

/// Notification callback (see [`Notification`])
pub type Notify = Arc<dyn Fn(&Notification<'_>) + Send + Sync>;

#[derive(Clone)]
pub struct Scope {
    globals: Arc<RwLock<Node>>,
    notifiers: Arc<RwLock<HashMap<String, Notify>>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("globals", &*self.globals.read())
            .field("notifiers", &self.notifiers.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            globals: Arc::new(RwLock::new(Node::map())),
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builder form of [`Scope::define`]
    pub fn with_root(self, name: &str, value: impl Into<Node>) -> Self {
        self.define(name, value);
        self
    }

    /// Place (or replace) a named global
    pub fn define(&self, name: &str, value: impl Into<Node>) {
        self.globals.write().set(name, value.into());
    }

    /// Copy of a named global
    pub fn get(&self, name: &str) -> Option<Node> {
        self.globals.read().get(name).cloned()
    }

    /// Copy of the whole global namespace
    pub fn snapshot(&self) -> Node {
        self.globals.read().clone()
    }

    /// Run `f` with shared access to the global namespace
    pub fn read<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(&self.globals.read())
    }

    /// Run `f` with exclusive access to the global namespace
    ///
    /// Host code mutates bound objects through this; the panel picks the
    /// change up on its next refresh.
    pub fn write<R>(&self, f: impl FnOnce(&mut Node) -> R) -> R {
        f(&mut self.globals.write())
    }

    pub fn register_notifier(
        &self,
        name: &str,
        notify: impl Fn(&Notification<'_>) + Send + Sync + 'static,
    ) {
        self.notifiers
            .write()
            .insert(name.to_string(), Arc::new(notify));
    }

    pub fn notifier(&self, name: &str) -> Option<Notify> {
        self.notifiers.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn define_and_get() {
        let scope = Scope::new().with_root("model", json!({"x": 1}));
        assert_eq!(scope.get("model"), Some(Node::from(json!({"x": 1}))));
        assert_eq!(scope.get("missing"), None);
    }

    #[test]
    fn clones_share_state() {
        let scope = Scope::new();
        let other = scope.clone();
        other.define("n", 2.0);
        assert_eq!(scope.get("n"), Some(Node::from(2.0)));
    }

    #[test]
    fn write_then_read() {
        let scope = Scope::new().with_root("model", json!({"x": 1}));
        scope.write(|g| {
            g.get_mut("model").unwrap().set("x", Node::from("changed"));
        });
        let x = scope.read(|g| g.walk(&["model".to_string(), "x".to_string()]).cloned());
        assert_eq!(x, Some(Node::from("changed")));
    }

    #[test]
    fn notifiers_by_name() {
        let scope = Scope::new();
        scope.register_notifier("onChange", |_| {});
        assert!(scope.notifier("onChange").is_some());
        assert!(scope.notifier("other").is_none());
    }
}
