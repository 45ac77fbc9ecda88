#![forbid(unsafe_code)]

pub mod access;
pub mod calendar;
pub mod model;
pub mod ratio;
pub mod report;
pub mod time;

pub use time::Clock;
