#![allow(dead_code)]
use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::ComponentId;

/// A request to dispatch `power` watts across a set of battery/inverter
/// pairs. Positive = consume from grid / charge batteries, negative =
/// supply to grid / discharge batteries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub namespace: String,
    pub power: f64,
    pub batteries: HashSet<ComponentId>,
    #[serde(with = "duration_as_millis")]
    pub request_timeout: Duration,
    #[serde(default = "default_true")]
    pub adjust_power: bool,
    #[serde(default)]
    pub include_broken_batteries: bool,
}

fn default_true() -> bool {
    true
}

impl Request {
    pub fn new(
        namespace: impl Into<String>,
        power: f64,
        batteries: HashSet<ComponentId>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            power,
            batteries,
            request_timeout,
            adjust_power: true,
            include_broken_batteries: false,
        }
    }

    pub fn with_adjust_power(mut self, adjust_power: bool) -> Self {
        self.adjust_power = adjust_power;
        self
    }

    pub fn with_include_broken_batteries(mut self, include_broken_batteries: bool) -> Self {
        self.include_broken_batteries = include_broken_batteries;
        self
    }
}

mod duration_as_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
