//! HTTP inbound adapter: the protocol webhook plus operational endpoints.

pub mod error;
pub mod health;
pub mod params;
pub mod payment;
pub mod response;
pub mod state;
pub mod transactions;
