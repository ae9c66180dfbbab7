//! Pointer-driven state machine: dragging out new regions, selecting existing
//! ones and resizing the selection by its corner handles.
//!
//! Every point handed in here is already in natural space. The machine never
//! fails; input that cannot produce a valid region is dropped.

use egui::{Pos2, Rect};

use crate::geometry::{Corner, span};
use crate::region::{RegionId, RegionStore};

/// Minimum committed width and height, in natural pixels.
pub const MIN_REGION_SIZE: f32 = 10.0;

/// Observable state of the editor's pointer handling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    Drawing { anchor: Pos2, current: Pos2 },
    Selected(RegionId),
    Resizing { id: RegionId, corner: Corner },
}

/// What a transition did, so the caller knows whether to repaint or persist.
/// Ordered by significance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    /// Nothing visible changed.
    Unchanged,
    /// Selection or the transient rectangle changed; the store's geometry did not.
    Redraw,
    /// The region list itself changed.
    Committed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Drawing {
        anchor: Pos2,
        current: Pos2,
    },
    Resizing {
        id: RegionId,
        corner: Corner,
        anchor: Pos2,
        original: Rect,
    },
}

#[derive(Clone, Debug)]
pub struct InteractionMachine {
    gesture: Option<Gesture>,
    min_size: f32,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(MIN_REGION_SIZE)
    }
}

impl InteractionMachine {
    pub fn new(min_size: f32) -> Self {
        Self {
            gesture: None,
            min_size: min_size.max(0.0),
        }
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    pub fn state(&self, store: &RegionStore) -> InteractionState {
        match self.gesture {
            Some(Gesture::Drawing { anchor, current }) => {
                InteractionState::Drawing { anchor, current }
            }
            Some(Gesture::Resizing { id, corner, .. }) => InteractionState::Resizing { id, corner },
            None => store
                .selected()
                .map_or(InteractionState::Idle, InteractionState::Selected),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gesture.is_some()
    }

    /// The in-progress rectangle while drawing, normalized.
    pub fn transient(&self) -> Option<Rect> {
        match self.gesture {
            Some(Gesture::Drawing { anchor, current }) => Some(span(anchor, current)),
            _ => None,
        }
    }

    /// `handle` is the corner handle of the current selection under the pointer,
    /// if any; the caller resolves it because handles have a fixed display size.
    pub fn pointer_down(
        &mut self,
        store: &mut RegionStore,
        point: Pos2,
        handle: Option<Corner>,
    ) -> Outcome {
        let mut outcome = self.cancel(store);

        if let (Some(corner), Some(region)) = (handle, store.selected_region()) {
            let original = region.rect();
            log::debug!("resizing {} from {corner:?}", region.id);
            self.gesture = Some(Gesture::Resizing {
                id: region.id,
                corner,
                anchor: corner.opposite().of(original),
                original,
            });
            return Outcome::Redraw.max(outcome);
        }

        if let Some(id) = store.hit_test(point) {
            if store.select(Some(id)) {
                log::debug!("selected {id}");
                outcome = outcome.max(Outcome::Redraw);
            }
            return outcome;
        }

        if store.select(None) {
            outcome = outcome.max(Outcome::Redraw);
        }
        self.gesture = Some(Gesture::Drawing {
            anchor: point,
            current: point,
        });
        outcome.max(Outcome::Redraw)
    }

    pub fn pointer_move(&mut self, store: &mut RegionStore, point: Pos2) -> Outcome {
        match &mut self.gesture {
            Some(Gesture::Drawing { current, .. }) => {
                if *current == point {
                    return Outcome::Unchanged;
                }
                *current = point;
                Outcome::Redraw
            }
            Some(Gesture::Resizing { id, anchor, .. }) => {
                let rect = span(*anchor, point);
                match store.get_mut(*id) {
                    Some(region) if region.rect() != rect => {
                        region.set_rect(rect);
                        Outcome::Redraw
                    }
                    Some(_) => Outcome::Unchanged,
                    None => {
                        self.gesture = None;
                        Outcome::Redraw
                    }
                }
            }
            None => Outcome::Unchanged,
        }
    }

    pub fn pointer_up(&mut self, store: &mut RegionStore, point: Pos2) -> Outcome {
        self.pointer_move(store, point);
        match self.gesture.take() {
            Some(Gesture::Drawing { anchor, current }) => {
                let rect = span(anchor, current);
                if self.is_large_enough(rect) {
                    let id = store.insert(rect);
                    store.select(Some(id));
                    log::debug!("committed {id} at {rect:?}");
                    Outcome::Committed
                } else {
                    log::debug!("discarded undersized rectangle {rect:?}");
                    Outcome::Redraw
                }
            }
            Some(Gesture::Resizing { id, original, .. }) => {
                let Some(region) = store.get_mut(id) else {
                    return Outcome::Redraw;
                };
                let rect = region.rect();
                if !self.is_large_enough(rect) {
                    log::debug!("resize of {id} below minimum, reverting");
                    region.set_rect(original);
                    Outcome::Redraw
                } else if rect == original {
                    Outcome::Redraw
                } else {
                    Outcome::Committed
                }
            }
            None => Outcome::Unchanged,
        }
    }

    /// Abandons any gesture in progress. A resize reverts to its starting geometry.
    pub fn cancel(&mut self, store: &mut RegionStore) -> Outcome {
        match self.gesture.take() {
            Some(Gesture::Drawing { .. }) => Outcome::Redraw,
            Some(Gesture::Resizing { id, original, .. }) => {
                if let Some(region) = store.get_mut(id) {
                    region.set_rect(original);
                }
                Outcome::Redraw
            }
            None => Outcome::Unchanged,
        }
    }

    /// Drops any gesture without touching a store; used when the store itself is replaced.
    pub fn reset(&mut self) {
        self.gesture = None;
    }

    fn is_large_enough(&self, rect: Rect) -> bool {
        rect.width() >= self.min_size && rect.height() >= self.min_size
    }
}
