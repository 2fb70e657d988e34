//! Downstream provider adapters.

pub mod simulator;

pub use simulator::SimulatedProvider;
