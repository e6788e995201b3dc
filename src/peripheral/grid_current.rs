//! 3-phase grid current: sum the current each component directly
//! connected to the grid contributes on each phase. Inverters and EV
//! chargers that report no reading this tick are treated as `0` (they
//! are excluded from the sum); meters that report no reading propagate
//! `None` for the whole phase, since a missing meter reading means the
//! net current genuinely cannot be computed.
#![allow(dead_code)]
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::types::{Component, ComponentCategory, ComponentId};
use crate::graph::ComponentGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    L1,
    L2,
    L3,
}

/// A component's current reading for one phase. `None` means the
/// component did not report a value this tick.
pub trait PhaseCurrentSource {
    fn phase_current(&self, component_id: ComponentId, phase: Phase) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ThreePhaseCurrent {
    pub l1_a: f64,
    pub l2_a: f64,
    pub l3_a: f64,
}

/// Compute 3-phase current for the grid component's immediate
/// successors. Returns `None` if any meter among them is missing a
/// reading for one of the phases.
pub fn grid_current(
    graph: &dyn ComponentGraph,
    grid_id: ComponentId,
    source: &dyn PhaseCurrentSource,
) -> Option<ThreePhaseCurrent> {
    let successors = graph.successors(grid_id);
    Some(ThreePhaseCurrent {
        l1_a: sum_phase(&successors, source, Phase::L1)?,
        l2_a: sum_phase(&successors, source, Phase::L2)?,
        l3_a: sum_phase(&successors, source, Phase::L3)?,
    })
}

fn sum_phase(
    successors: &HashSet<Component>,
    source: &dyn PhaseCurrentSource,
    phase: Phase,
) -> Option<f64> {
    let mut total = 0.0;
    for comp in successors {
        match comp.category {
            ComponentCategory::Inverter | ComponentCategory::EvCharger => {
                total += source.phase_current(comp.id, phase).unwrap_or(0.0);
            }
            ComponentCategory::Meter => {
                total += source.phase_current(comp.id, phase)?;
            }
            _ => continue,
        }
    }
    Some(total)
}
