use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::event_bus::{EventBus, EventName, SubscriptionId};

/// A single enum rather than two flags, so the overlay can never be asked
/// to fade both ways at once.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FadeState {
    #[default]
    Idle,
    FadingToBlack,
    FadingFromBlack,
}

impl FadeState {
    /// Overlay opacity this state is moving towards.
    pub fn target(self) -> Option<f32> {
        match self {
            FadeState::Idle => None,
            FadeState::FadingToBlack => Some(1.0),
            FadeState::FadingFromBlack => Some(0.0),
        }
    }

    /// Next state when a fade is requested while in this one.
    ///
    /// A second to-black request while already fading to black reverses the
    /// fade: the user pressed the opposite direction before the screen went
    /// dark, so the current image stays.
    pub fn on_request(self, direction: i32) -> FadeState {
        match (self, direction < 0) {
            (FadeState::Idle, true) => FadeState::FadingToBlack,
            (FadeState::Idle, false) => FadeState::FadingFromBlack,
            (FadeState::FadingToBlack, true) => FadeState::FadingFromBlack,
            (FadeState::FadingToBlack, false) => FadeState::FadingToBlack,
            (FadeState::FadingFromBlack, _) => FadeState::FadingFromBlack,
        }
    }
}

/// Drives the full-screen black overlay.
///
/// Listens for `StartFade` (negative = to black, otherwise from black) and
/// publishes `FadeDone` with `-1` once the screen is fully black or `1` once
/// it is fully visible again. A speed of zero never completes.
pub struct FadeController {
    bus: Rc<EventBus>,
    speed: f32,
    state: Cell<FadeState>,
    opacity: Cell<f32>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl FadeController {
    pub fn new(bus: Rc<EventBus>, speed: f32) -> Rc<Self> {
        Rc::new(Self {
            bus,
            speed,
            state: Cell::new(FadeState::Idle),
            opacity: Cell::new(0.0),
            subscription: Cell::new(None),
        })
    }

    /// Starts listening for `StartFade`. Must be paired with [`FadeController::deactivate`].
    pub fn activate(self: &Rc<Self>) {
        if self.subscription.get().is_some() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = self.bus.subscribe_int(EventName::StartFade, move |direction| {
            if let Some(fader) = weak.upgrade() {
                fader.start_fade(direction);
            }
        });
        self.subscription.set(Some(id));
    }

    pub fn deactivate(&self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(EventName::StartFade, id);
        }
    }

    pub fn start_fade(&self, direction: i32) {
        let current = self.state.get();
        let next = current.on_request(direction);
        debug!(?current, ?next, direction, "fade requested");
        self.state.set(next);
    }

    /// Advances the overlay by one frame of `dt` seconds.
    pub fn update(&self, dt: f32) {
        let state = self.state.get();
        let Some(target) = state.target() else {
            return;
        };

        let opacity = move_towards(self.opacity.get(), target, self.speed * dt);
        self.opacity.set(opacity);
        trace!(?state, opacity, "fade tick");

        if opacity == target {
            let value = if state == FadeState::FadingToBlack { -1 } else { 1 };
            // State is settled before publishing, a listener may start the next fade.
            self.state.set(FadeState::Idle);
            debug!(value, "fade complete");
            self.bus.publish_int(EventName::FadeDone, value);
        }
    }

    pub fn state(&self) -> FadeState {
        self.state.get()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity.get()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_fading(&self) -> bool {
        self.state.get() != FadeState::Idle
    }
}

impl Drop for FadeController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
