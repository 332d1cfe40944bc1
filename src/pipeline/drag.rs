use crate::errors::AppResult;
use crate::layout::LayoutStore;
use crate::pipeline::{Widget, WidgetView};
use std::sync::{Arc, Mutex};

pub const GRID_COLUMNS: usize = 4;
pub const CELL_WIDTH_PX: f64 = 320.0;
pub const CELL_HEIGHT_PX: f64 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    origin: (f64, f64),
    current: (f64, f64),
}

/// Tracks pointer movement in transient local state; shared layout changes
/// only at release, as a single swap with the nearest-in-sequence target.
pub struct DragController {
    widget_id: String,
    layout: LayoutStore,
    active: Mutex<Option<DragState>>,
}

impl DragController {
    pub fn new(widget_id: String, layout: LayoutStore) -> Self {
        Self {
            widget_id,
            layout,
            active: Mutex::new(None),
        }
    }

    pub fn begin(&self, x: f64, y: f64) {
        *self.lock() = Some(DragState {
            origin: (x, y),
            current: (x, y),
        });
    }

    /// No-op unless a drag is active.
    pub fn track(&self, x: f64, y: f64) {
        if let Some(state) = self.lock().as_mut() {
            state.current = (x, y);
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.lock().as_ref().map(|state| state.current)
    }

    /// Commits the swap against the layout store and reports the pair, or
    /// `None` when there was no active drag or no displacement worth a move.
    pub fn release(&self) -> Option<(String, String)> {
        let state = self.lock().take()?;

        let dx = state.current.0 - state.origin.0;
        let dy = state.current.1 - state.origin.1;
        let column_delta = (dx / CELL_WIDTH_PX).round() as isize;
        let row_delta = (dy / CELL_HEIGHT_PX).round() as isize;
        let slot_delta = row_delta * GRID_COLUMNS as isize + column_delta;
        if slot_delta == 0 {
            return None;
        }

        let order = self.layout.visible_widget_ids();
        let index = order.iter().position(|id| *id == self.widget_id)? as isize;
        let target_index = (index + slot_delta).clamp(0, order.len() as isize - 1) as usize;
        if target_index == index as usize {
            return None;
        }

        let target = order[target_index].clone();
        self.layout.swap(&self.widget_id, &target);
        Some((self.widget_id.clone(), target))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<DragState>> {
        self.active.lock().expect("drag controller lock")
    }
}

/// Renders the draggable affix above the wrapped widget.
pub struct DragHandleLayer {
    inner: Box<dyn Widget>,
    controller: Arc<DragController>,
}

impl DragHandleLayer {
    pub fn new(inner: Box<dyn Widget>, controller: Arc<DragController>) -> Self {
        Self { inner, controller }
    }

    pub fn controller(&self) -> &Arc<DragController> {
        &self.controller
    }
}

impl Widget for DragHandleLayer {
    fn widget_id(&self) -> &str {
        self.inner.widget_id()
    }

    fn render(&self) -> AppResult<WidgetView> {
        let mut view = self.inner.render()?;
        view.drag_handle = true;
        Ok(view)
    }

    fn mount(&self) {
        self.inner.mount();
    }

    fn unmount(&self) {
        self.inner.unmount();
    }
}
