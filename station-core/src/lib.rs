//! Polling, recovery and rendering logic for the multi-sensor station.
//!
//! Everything in this crate is hardware independent: the firmware supplies
//! the bus, display, button and delay implementations through the traits in
//! [`bus`], [`io`] and [`sensors`].

pub mod air_quality;
pub mod bus;
pub mod config;
pub mod debounce;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod render;
pub mod sensors;
pub mod snapshot;
pub mod station;

#[cfg(test)]
mod testing;

pub use air_quality::{AirQualityMode, AirQualitySession, AqiCategory, RawIndices, TvocRating};
pub use config::StationConfig;
pub use debounce::{Debouncer, ModeToggle};
pub use diagnostics::{Device, ErrorCounters};
pub use error::{BusError, DecodeError, DisplayError, SensorError};
pub use render::{DisplayMode, Frame, FrameRenderer};
pub use snapshot::SensorSnapshot;
pub use station::{CycleReport, Devices, Station};
