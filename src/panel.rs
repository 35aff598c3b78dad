//! Panel - ordered collection of bound controls (v0.1)
//!
//! A panel owns a sequence of (descriptor, control) entries and keeps its
//! surface in the same order after every operation. Index-based operations
//! that cannot apply return an error and leave the panel untouched.
//!
//! User input arrives through [`Panel::dispatch`]; every successful write is
//! reported to the configured notifier as a [`Notification::Changed`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::control::{self, Context, Control, ControlHandle, ControlView, Outcome, UserEvent};
use crate::descriptor::{self, ControlKind, Descriptor};
use crate::error::CtrlError;
use crate::generate;
use crate::node::Node;
use crate::path::PathResolver;
use crate::present::DisplayValue;
use crate::scope::{Notify, Scope};
use crate::surface::Surface;

/// Panel shared with the periodic refresh task
pub type SharedPanel = Arc<Mutex<Panel>>;

/// Events reported to the host's notifier
///
/// Notifiers run while the panel is borrowed; they must not call back into
/// the same panel synchronously.
#[derive(Debug)]
pub enum Notification<'a> {
    /// Sent once when the panel is built
    Initialized,
    /// A user edit was stored
    Changed {
        /// Container after the write
        container: &'a Node,
        key: Option<&'a str>,
        value: &'a Node,
        descriptor: &'a Descriptor,
        handle: ControlHandle,
    },
}

#[derive(Debug)]
struct Entry {
    descriptor: Descriptor,
    control: Control,
    handle: ControlHandle,
}

pub struct Panel {
    scope: Scope,
    config: PanelConfig,
    resolver: PathResolver,
    notifier: Option<Notify>,
    surface: Box<dyn Surface>,
    entries: Vec<Entry>,
    /// Inline message shown above the entries (control list failed to parse)
    notice: Option<Entry>,
    next_handle: u64,
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("config", &self.config)
            .field("entries", &self.entries)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl Panel {
    /// Empty panel
    pub fn new(scope: Scope, config: PanelConfig, surface: impl Surface + 'static) -> Self {
        let mut panel = Self::build(scope, config, Box::new(surface));
        panel.auto_generate();
        panel.notify(&Notification::Initialized);
        panel
    }

    pub fn with_descriptors(
        scope: Scope,
        config: PanelConfig,
        surface: impl Surface + 'static,
        descriptors: Vec<Descriptor>,
    ) -> Self {
        let mut panel = Self::build(scope, config, Box::new(surface));
        for descriptor in descriptors {
            panel.add(descriptor);
        }
        panel.auto_generate();
        panel.notify(&Notification::Initialized);
        panel
    }

    /// Panel from a JSON control list
    ///
    /// A malformed list does not fail: the panel shows a single header with
    /// the parse error and binds nothing.
    pub fn from_json(
        scope: Scope,
        config: PanelConfig,
        surface: impl Surface + 'static,
        json: &str,
    ) -> Self {
        let mut panel = Self::build(scope, config, Box::new(surface));
        panel.load_json(json);
        panel.notify(&Notification::Initialized);
        panel
    }

    fn build(scope: Scope, config: PanelConfig, mut surface: Box<dyn Surface>) -> Self {
        surface.restyle(&config.style());
        let resolver = PathResolver::new(&config.reference);
        let notifier = resolve_notifier(&scope, config.callback.as_deref());
        Self {
            scope,
            config,
            resolver,
            notifier,
            surface,
            entries: Vec::new(),
            notice: None,
            next_handle: 0,
        }
    }

    /// Replace every control with the list in `json`
    pub fn load_json(&mut self, json: &str) {
        self.teardown();
        match descriptor::parse_list(json) {
            Ok(descriptors) => {
                for descriptor in descriptors {
                    self.add(descriptor);
                }
                self.auto_generate();
            }
            Err(err) => {
                warn!(error = %err, "control list rejected");
                let header = Descriptor::new(ControlKind::Header).with_text(format!("ctrling: {err}"));
                let (handle, control) = self.materialize(&header);
                self.surface.insert(0, &control.view(handle));
                self.notice = Some(Entry {
                    descriptor: header,
                    control,
                    handle,
                });
            }
        }
    }

    fn auto_generate(&mut self) {
        if !self.config.auto_generate || !self.entries.is_empty() || self.notice.is_some() {
            return;
        }
        let Some(root) = self.resolver.reference().and_then(|r| self.scope.get(r)) else {
            return;
        };
        let descriptors = generate::descriptors_from(&root);
        info!(count = descriptors.len(), "controls generated from root shape");
        for descriptor in descriptors {
            self.add(descriptor);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Number of bound entries (the notice is not counted)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of controls shown, notice included
    pub fn control_count(&self) -> usize {
        self.entries.len() + usize::from(self.notice.is_some())
    }

    /// Inline error message, if the control list failed to parse
    pub fn notice(&self) -> Option<&DisplayValue> {
        self.notice.as_ref().map(|entry| entry.control.display())
    }

    pub fn descriptors(&self) -> Vec<&Descriptor> {
        self.entries.iter().map(|entry| &entry.descriptor).collect()
    }

    pub fn descriptor(&self, index: usize) -> Option<&Descriptor> {
        self.entries.get(index).map(|entry| &entry.descriptor)
    }

    pub fn control(&self, index: usize) -> Option<&Control> {
        self.entries.get(index).map(|entry| &entry.control)
    }

    pub fn handle(&self, index: usize) -> Option<ControlHandle> {
        self.entries.get(index).map(|entry| entry.handle)
    }

    pub fn display(&self, index: usize) -> Option<&DisplayValue> {
        self.control(index).map(Control::display)
    }

    pub fn index_of(&self, handle: ControlHandle) -> Option<usize> {
        self.entries.iter().position(|entry| entry.handle == handle)
    }

    pub fn index_by_id(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.descriptor.id.as_deref() == Some(id))
    }

    pub fn descriptor_by_id(&self, id: &str) -> Option<&Descriptor> {
        self.index_by_id(id).and_then(|index| self.descriptor(index))
    }

    /// Views of every shown control in surface order
    pub fn views(&self) -> Vec<ControlView> {
        self.notice
            .iter()
            .chain(self.entries.iter())
            .map(|entry| entry.control.view(entry.handle))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Sequence operations
    // ─────────────────────────────────────────────────────────────

    /// Append a control
    pub fn add(&mut self, descriptor: Descriptor) -> ControlHandle {
        let index = self.entries.len();
        self.splice_in(index, descriptor)
    }

    /// Append a control given as JSON; unknown kinds are rejected
    pub fn add_json(&mut self, json: &str) -> Result<ControlHandle, CtrlError> {
        let descriptor = Descriptor::parse(json)?;
        Ok(self.add(descriptor))
    }

    /// Insert before the control at `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, descriptor: Descriptor) -> Result<ControlHandle, CtrlError> {
        if index > self.entries.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.splice_in(index, descriptor))
    }

    /// Remove the control at `index`, detaching its listeners
    pub fn remove(&mut self, index: usize) -> Result<Descriptor, CtrlError> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        let slot = self.slot(index);
        let mut entry = self.entries.remove(index);
        let detached = entry.control.detach();
        self.surface.remove(slot);
        debug!(index, handle = %entry.handle, detached, "control removed");
        Ok(entry.descriptor)
    }

    /// Re-materialize the control at `index`, with a new descriptor if given
    ///
    /// The old control's listeners are detached and it gets a new handle.
    pub fn update(
        &mut self,
        index: usize,
        descriptor: Option<Descriptor>,
    ) -> Result<ControlHandle, CtrlError> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        let descriptor = descriptor.unwrap_or_else(|| self.entries[index].descriptor.clone());
        Ok(self.rematerialize(index, descriptor))
    }

    /// Swap the descriptor at `index`
    pub fn replace(&mut self, index: usize, descriptor: Descriptor) -> Result<ControlHandle, CtrlError> {
        self.update(index, Some(descriptor))
    }


    /// Refresh every live control; returns how many displays changed
    pub fn refresh_all(&mut self) -> usize {
        let offset = usize::from(self.notice.is_some());
        let mut changed = 0;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.control.refresh(&self.scope) {
                self.surface.update(index + offset, entry.control.display());
                changed += 1;
            }
        }
        changed
    }

    /// Deliver a user event to the control behind `handle`
    ///
    /// Handles of removed or replaced controls are rejected, so no callback
    /// ever runs against a detached control.
    pub fn dispatch(&mut self, handle: ControlHandle, event: UserEvent) -> Result<Outcome, CtrlError> {
        let index = self
            .index_of(handle)
            .ok_or(CtrlError::Detached { handle: handle.id() })?;
        let slot = self.slot(index);

        let entry = &mut self.entries[index];
        let outcome = entry.control.handle(event, &self.scope);
        if let Outcome::Wrote(change) = &outcome {
            self.surface.update(slot, entry.control.display());
            if let Some(notify) = &self.notifier {
                notify(&Notification::Changed {
                    container: &change.container,
                    key: change.key.as_deref(),
                    value: &change.value,
                    descriptor: &entry.descriptor,
                    handle,
                });
            }
        }
        Ok(outcome)
    }

    /// [`Panel::dispatch`] by position
    pub fn dispatch_at(&mut self, index: usize, event: UserEvent) -> Result<Outcome, CtrlError> {
        let handle = self.handle(index).ok_or_else(|| self.out_of_range(index))?;
        self.dispatch(handle, event)
    }

    /// Detach every listener and clear the surface
    pub fn teardown(&mut self) {
        let detached: usize = self
            .entries
            .iter_mut()
            .chain(self.notice.iter_mut())
            .map(|entry| entry.control.detach())
            .sum();
        if detached > 0 || !self.entries.is_empty() || self.notice.is_some() {
            debug!(controls = self.control_count(), detached, "panel torn down");
        }
        self.entries.clear();
        self.notice = None;
        self.surface.clear();
    }

    // ─────────────────────────────────────────────────────────────
    // Configuration (each option applies on its own)
    // ─────────────────────────────────────────────────────────────

    /// Apply a whole configuration, re-doing only what changed
    pub fn configure(&mut self, config: PanelConfig) {
        let previous = std::mem::replace(&mut self.config, config);

        if previous.style() != self.config.style() {
            self.surface.restyle(&self.config.style());
        }
        if previous.callback != self.config.callback {
            self.notifier = resolve_notifier(&self.scope, self.config.callback.as_deref());
        }
        if previous.reference != self.config.reference {
            self.resolver = PathResolver::new(&self.config.reference);
            for index in 0..self.entries.len() {
                let descriptor = self.entries[index].descriptor.clone();
                self.rematerialize(index, descriptor);
            }
            self.auto_generate();
        } else if !previous.auto_generate && self.config.auto_generate {
            self.auto_generate();
        }
    }

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        let mut config = self.config.clone();
        config.reference = reference.into();
        self.configure(config);
    }

    pub fn set_callback(&mut self, callback: Option<String>) {
        let mut config = self.config.clone();
        config.callback = callback;
        self.configure(config);
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        let mut config = self.config.clone();
        config.dark_mode = dark_mode;
        self.configure(config);
    }

    pub fn set_geometry(&mut self, width: &str, top: &str, right: &str) {
        let mut config = self.config.clone();
        config.width = width.to_string();
        config.top = top.to_string();
        config.right = right.to_string();
        self.configure(config);
    }

    /// A running timer ends on its next tick; starting one again needs
    /// [`crate::ticker::AutoRefresh::sync`]
    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.config.auto_update = auto_update;
    }

    /// A running timer picks up the new rate on its next tick
    pub fn set_ticks_per_second(&mut self, ticks: u32) {
        self.config.ticks_per_second = ticks;
    }

    pub fn set_auto_generate(&mut self, auto_generate: bool) {
        let mut config = self.config.clone();
        config.auto_generate = auto_generate;
        self.configure(config);
    }

    pub fn into_shared(self) -> SharedPanel {
        Arc::new(Mutex::new(self))
    }

    // ─────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────

    /// Rebuild the control at `index` (caller checks the bound)
    fn rematerialize(&mut self, index: usize, descriptor: Descriptor) -> ControlHandle {
        let (handle, control) = self.materialize(&descriptor);
        let slot = self.slot(index);
        self.surface.replace(slot, &control.view(handle));

        let entry = &mut self.entries[index];
        let detached = entry.control.detach();
        debug!(index, old = %entry.handle, new = %handle, detached, "control updated");
        *entry = Entry {
            descriptor,
            control,
            handle,
        };
        handle
    }

    fn materialize(&mut self, descriptor: &Descriptor) -> (ControlHandle, Control) {
        let control = control::materialize(
            descriptor,
            &Context {
                scope: &self.scope,
                resolver: &self.resolver,
            },
        );
        self.next_handle += 1;
        (ControlHandle(self.next_handle), control)
    }

    fn splice_in(&mut self, index: usize, descriptor: Descriptor) -> ControlHandle {
        let (handle, control) = self.materialize(&descriptor);
        let slot = self.slot(index);
        self.surface.insert(slot, &control.view(handle));
        self.entries.insert(
            index,
            Entry {
                descriptor,
                control,
                handle,
            },
        );
        handle
    }

    /// Surface position of entry `index`
    fn slot(&self, index: usize) -> usize {
        index + usize::from(self.notice.is_some())
    }

    fn out_of_range(&self, index: usize) -> CtrlError {
        CtrlError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        }
    }

    fn notify(&self, notification: &Notification<'_>) {
        if let Some(notify) = &self.notifier {
            notify(notification);
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn resolve_notifier(scope: &Scope, name: Option<&str>) -> Option<Notify> {
    let name = name?;
    let notifier = scope.notifier(name);
    if notifier.is_none() {
        warn!(callback = name, "no notifier registered under this name");
    }
    notifier
}
