#![allow(dead_code)]
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::request::Request;
use super::types::{ComponentId, PowerBounds};

/// Conservation tolerance, watts.
pub const POWER_TOLERANCE_W: f64 = 1e-9;

/// The closed set of outcomes a request can produce. Pattern-match on
/// this; there are exactly four variants, by design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Result {
    Success {
        request: Request,
        succeeded_power: f64,
        excess_power: f64,
        succeeded_batteries: HashSet<ComponentId>,
        failed_batteries: HashSet<ComponentId>,
    },
    OutOfBounds {
        request: Request,
        bounds: PowerBounds,
    },
    Error {
        request: Request,
        msg: String,
    },
    PartialFailure {
        request: Request,
        succeeded_power: f64,
        failed_power: f64,
        succeeded_batteries: HashSet<ComponentId>,
        failed_batteries: HashSet<ComponentId>,
    },
}

impl Result {
    pub fn request(&self) -> &Request {
        match self {
            Result::Success { request, .. }
            | Result::OutOfBounds { request, .. }
            | Result::Error { request, .. }
            | Result::PartialFailure { request, .. } => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::Request;
    use std::time::Duration;

    #[test]
    fn round_trips_through_json() {
        let result = Result::PartialFailure {
            request: Request::new("ns", 1000.0, HashSet::from([9, 19]), Duration::from_secs(1)),
            succeeded_power: 500.0,
            failed_power: 500.0,
            succeeded_batteries: HashSet::from([9]),
            failed_batteries: HashSet::from([19]),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: Result = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
