//! Domain entities returned by the transit data provider.

pub mod types;

pub use types::{
    GeoPoint, Route, Schedule, Stop, StopFilter, TimeWindow, TransitMode, Vehicle, VehicleFilter,
};
