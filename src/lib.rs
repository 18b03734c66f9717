//! 360° panorama viewer.
//!
//! A fixed list of equirectangular images is shown one at a time on the
//! inside of a sphere. Changing image fades the screen to black, swaps the
//! texture and fades back; the controllers talk through an [`EventBus`].

pub mod asset;
pub mod config;
pub mod constants;
pub mod error;
pub mod event_bus;
pub mod fader;
pub mod image_cycle;
pub mod image_set;
pub mod look;
pub mod texture_loader;
pub mod toolbox;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use crate::asset::AssetSource;
pub use crate::config::Config;
pub use crate::error::{Result, ViewerError};
pub use crate::event_bus::{Channel, EventBus, EventName, Payload, SubscriptionId};
pub use crate::fader::{FadeController, FadeState};
pub use crate::image_cycle::{ImageCycleController, wrap_index};
pub use crate::image_set::ImageSet;
pub use crate::look::{LookController, LookSettings};
pub use crate::toolbox::Toolbox;
