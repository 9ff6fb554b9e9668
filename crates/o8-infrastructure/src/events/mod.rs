//! Event distribution

pub mod bus;

pub use bus::TokioEventBus;
