use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::asset::AssetSource;
use crate::error::{Result, ViewerError};
use crate::event_bus::{EventBus, EventName, SubscriptionId};
use crate::image_set::ImageSet;

/// Steps `index` by `step` around a ring of `len` slots.
///
/// Stepping below zero lands on the last slot, stepping past the end lands
/// on the first. An empty ring always yields 0.
pub fn wrap_index(index: usize, step: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as i64 + step as i64).rem_euclid(len as i64) as usize
}

/// An asset together with the index it was loaded from.
struct Slot<A> {
    index: usize,
    asset: A,
}

struct CycleState<S: AssetSource> {
    source: S,
    current_index: usize,
    pending_direction: i32,
    previous_index: Option<usize>,
    displayed: Option<Slot<S::Asset>>,
    cached: Option<Slot<S::Asset>>,
}

/// Walks through the image set one panorama at a time.
///
/// A navigation request only records the direction and asks for a fade to
/// black; the swap itself happens when the fader reports the screen is dark,
/// after which a fade back is requested. The asset shown just before the
/// current one is kept so stepping straight back costs nothing.
pub struct ImageCycleController<S: AssetSource> {
    bus: Rc<EventBus>,
    images: ImageSet,
    state: RefCell<CycleState<S>>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl<S> ImageCycleController<S>
where
    S: AssetSource + 'static,
    S::Asset: 'static,
{
    pub fn new(bus: Rc<EventBus>, images: ImageSet, source: S, start_index: usize) -> Rc<Self> {
        let current_index = if images.is_empty() { 0 } else { start_index % images.len() };
        Rc::new(Self {
            bus,
            images,
            state: RefCell::new(CycleState {
                source,
                current_index,
                pending_direction: 0,
                previous_index: None,
                displayed: None,
                cached: None,
            }),
            subscription: Cell::new(None),
        })
    }

    /// Starts listening for `FadeDone`. Must be paired with [`ImageCycleController::deactivate`].
    pub fn activate(self: &Rc<Self>) {
        if self.subscription.get().is_some() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = self.bus.subscribe_int(EventName::FadeDone, move |value| {
            if let Some(cycle) = weak.upgrade() {
                cycle.on_fade_done(value);
            }
        });
        self.subscription.set(Some(id));
    }

    pub fn deactivate(&self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(EventName::FadeDone, id);
        }
    }

    /// Loads and displays the image at the current index.
    pub fn show_initial(&self) -> Result<()> {
        let index = self.state.borrow().current_index;
        self.display_index(index)
    }

    /// Loads and displays the first image, dropping whatever was cached.
    ///
    /// Any pending navigation is discarded, so a fade already under way
    /// comes back on the first image.
    pub fn reset_to_first(&self) -> Result<()> {
        self.display_index(0)
    }

    fn display_index(&self, index: usize) -> Result<()> {
        let path = self
            .images
            .get(index)
            .ok_or_else(|| ViewerError::InvalidConfig("image set is empty".to_string()))?;

        let mut state = self.state.borrow_mut();
        let asset = state.source.load(path)?;
        state.displayed = Some(Slot { index, asset });
        state.cached = None;
        state.previous_index = None;
        state.current_index = index;
        state.pending_direction = 0;
        info!(index, path = ?path, "showing panorama");
        Ok(())
    }

    /// Records a navigation request and asks for a fade to black.
    ///
    /// Pressing the same direction again while a change is pending does nothing.
    pub fn request_navigation(&self, direction: i32) {
        if self.images.is_empty() || direction == 0 {
            return;
        }

        {
            let mut state = self.state.borrow_mut();
            if direction == state.pending_direction {
                debug!(direction, "navigation already pending");
                return;
            }
            state.pending_direction = direction;
        }
        debug!(direction, "navigation requested");
        self.bus.publish_int(EventName::StartFade, -1);
    }

    /// Reacts to the fader finishing. Only a completed fade to black (`value < 0`) swaps the image.
    pub fn on_fade_done(&self, value: i32) {
        if value >= 0 {
            return;
        }

        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let len = self.images.len();
            let prev = state.current_index;
            let next = wrap_index(prev, state.pending_direction.signum(), len);

            if next == prev {
                debug!(index = next, "no image change");
            } else if state.previous_index == Some(next)
                && state.cached.as_ref().is_some_and(|slot| slot.index == next)
            {
                std::mem::swap(&mut state.displayed, &mut state.cached);
                info!(index = next, "restored previous panorama from cache");
            } else if let Some(path) = self.images.get(next) {
                match state.source.load(path) {
                    Ok(asset) => {
                        state.cached = state.displayed.replace(Slot { index: next, asset });
                        info!(index = next, path = ?path, "loaded panorama");
                    }
                    Err(error) => {
                        warn!(index = next, %error, "panorama failed to load, keeping current image");
                    }
                }
            }

            if next != prev {
                state.current_index = next;
                state.previous_index = Some(prev);
            }
            state.pending_direction = 0;
        }

        self.bus.publish_int(EventName::StartFade, 1);
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn current_index(&self) -> usize {
        self.state.borrow().current_index
    }

    pub fn pending_direction(&self) -> i32 {
        self.state.borrow().pending_direction
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.state.borrow().previous_index
    }

    pub fn has_cached(&self) -> bool {
        self.state.borrow().cached.is_some()
    }

    /// Index of the asset on screen. Lags behind [`ImageCycleController::current_index`]
    /// after a failed load.
    pub fn displayed_index(&self) -> Option<usize> {
        self.state.borrow().displayed.as_ref().map(|slot| slot.index)
    }

    /// The asset currently on screen, if any.
    pub fn displayed(&self) -> Option<Ref<'_, S::Asset>> {
        Ref::filter_map(self.state.borrow(), |state| state.displayed.as_ref().map(|slot| &slot.asset)).ok()
    }
}

impl<S: AssetSource> Drop for ImageCycleController<S> {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(EventName::FadeDone, id);
        }
    }
}
