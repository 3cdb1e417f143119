//! LowRes NX host frontend
//!
//! Window-system independent pieces of a host: the presenter that drives a
//! [`nx_core::Runtime`] from a frame clock, input profiles and mapping,
//! display geometry, companion disk files and persisted settings. A concrete
//! host implements [`presenter::DisplaySurface`] for its window or view.

pub mod disk;
pub mod error;
pub mod geometry;
pub mod host_delegate;
pub mod input;
pub mod input_mapper;
pub mod presenter;
pub mod scheduler;
pub mod settings;

pub use error::{HostError, SettingsError};
pub use presenter::{DisplaySurface, InputEvent, Presenter};
pub use scheduler::{FrameRate, FrameScheduler};
pub use settings::HostSettings;
