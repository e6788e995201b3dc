//! Peripheral logic that consumes the same `ComponentGraph` collaborator
//! as the distribution core but sits outside it. Kept as a
//! single worked example rather than a full formula-engine port.
pub mod grid_current;
