//! Surfaces - where materialized controls are shown
//!
//! The panel mirrors every structural change on its surface, so the surface's
//! element order is always the descriptor order. Rendering (markup, styling)
//! lives behind this trait.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Style;
use crate::control::{ControlHandle, ControlView};
use crate::present::DisplayValue;

pub trait Surface: Send {
    /// Insert an element before the one currently at `index` (append when
    /// `index` equals the element count)
    fn insert(&mut self, index: usize, view: &ControlView);

    fn remove(&mut self, index: usize);

    /// Swap the element at `index` for a freshly materialized one
    fn replace(&mut self, index: usize, view: &ControlView);

    /// Update the displayed value of the element at `index`
    fn update(&mut self, index: usize, display: &DisplayValue);

    /// Geometry or theme changed
    fn restyle(&mut self, _style: &Style) {}

    /// Remove everything (panel torn down)
    fn clear(&mut self);
}

/// Surface that discards everything
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn insert(&mut self, _index: usize, _view: &ControlView) {}
    fn remove(&mut self, _index: usize) {}
    fn replace(&mut self, _index: usize, _view: &ControlView) {}
    fn update(&mut self, _index: usize, _display: &DisplayValue) {}
    fn clear(&mut self) {}
}

#[derive(Debug, Default)]
struct MemoryState {
    elements: Vec<ControlView>,
    display_writes: usize,
    style: Option<Style>,
}

/// In-memory surface; clones share state so a host can keep one clone for
/// inspection after handing another to the panel
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> Vec<ControlView> {
        self.state.lock().elements.clone()
    }

    pub fn handles(&self) -> Vec<ControlHandle> {
        self.state.lock().elements.iter().map(|e| e.handle).collect()
    }

    /// Number of display updates applied so far
    pub fn display_writes(&self) -> usize {
        self.state.lock().display_writes
    }

    pub fn style(&self) -> Option<Style> {
        self.state.lock().style.clone()
    }
}

impl Surface for MemorySurface {
    fn insert(&mut self, index: usize, view: &ControlView) {
        let mut state = self.state.lock();
        let index = index.min(state.elements.len());
        state.elements.insert(index, view.clone());
    }

    fn remove(&mut self, index: usize) {
        let mut state = self.state.lock();
        if index < state.elements.len() {
            state.elements.remove(index);
        }
    }

    fn replace(&mut self, index: usize, view: &ControlView) {
        if let Some(element) = self.state.lock().elements.get_mut(index) {
            *element = view.clone();
        }
    }

    fn update(&mut self, index: usize, display: &DisplayValue) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(element) = state.elements.get_mut(index) {
            element.display = display.clone();
            state.display_writes += 1;
        }
    }

    fn restyle(&mut self, style: &Style) {
        self.state.lock().style = Some(style.clone());
    }

    fn clear(&mut self) {
        self.state.lock().elements.clear();
    }
}
