//! Power Distribution Core: accepts a power setpoint for a namespace and
//! splits it across battery/inverter pairs subject to each device's
//! operating envelope, reporting one of a closed set of outcomes per
//! request.
pub mod actor;
pub mod bounds;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod distribution;
pub mod domain;
pub mod eligibility;
pub mod graph;
pub mod peripheral;
pub mod router;
pub mod status;
pub mod telemetry;
