//! The inverter-dispatch collaborator. Sending a setpoint to
//! real hardware and waiting for its acknowledgement is out of scope
//! here; this module defines the trait the distribution loop depends on
//! plus a channel-backed simulated implementation for tests and demos.
#![allow(dead_code)]
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::domain::types::ComponentId;

/// One inverter accepted (or didn't) the power it was asked to carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchAck {
    pub inverter_id: ComponentId,
    pub accepted: bool,
}

/// Sends a setpoint to one inverter and reports whether it was
/// acknowledged within the caller's deadline.
#[async_trait]
pub trait InverterDispatch: Send + Sync {
    async fn dispatch(
        &self,
        inverter_id: ComponentId,
        setpoint_w: f64,
        deadline: Duration,
    ) -> DispatchAck;
}

struct SetpointCommand {
    inverter_id: ComponentId,
    setpoint_w: f64,
    ack: oneshot::Sender<bool>,
}

/// A simulated dispatch target: every inverter is backed by a worker
/// task reading from its own `mpsc` channel, matching the producer/
/// consumer split used for each simulated
/// device. By default every command is accepted; `reject` marks specific
/// inverter IDs as permanently unreachable, for exercising the
/// partial-failure path.
pub struct SimulatedDispatch {
    senders: HashMap<ComponentId, mpsc::Sender<SetpointCommand>>,
}

impl SimulatedDispatch {
    /// Spin up one worker per inverter ID. IDs in `unreachable` always
    /// NACK; everything else ACKs immediately.
    pub fn new(inverter_ids: impl IntoIterator<Item = ComponentId>, unreachable: &[ComponentId]) -> Self {
        let mut senders = HashMap::new();
        for id in inverter_ids {
            let (tx, mut rx) = mpsc::channel::<SetpointCommand>(16);
            let nack = unreachable.contains(&id);
            tokio::spawn(async move {
                while let Some(cmd) = rx.recv().await {
                    let _ = cmd.ack.send(!nack);
                }
            });
            senders.insert(id, tx);
        }
        Self { senders }
    }
}

#[async_trait]
impl InverterDispatch for SimulatedDispatch {
    async fn dispatch(
        &self,
        inverter_id: ComponentId,
        setpoint_w: f64,
        deadline: Duration,
    ) -> DispatchAck {
        let Some(tx) = self.senders.get(&inverter_id) else {
            return DispatchAck {
                inverter_id,
                accepted: false,
            };
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx
            .send(SetpointCommand {
                inverter_id,
                setpoint_w,
                ack: ack_tx,
            })
            .await
            .is_err()
        {
            return DispatchAck {
                inverter_id,
                accepted: false,
            };
        }
        let accepted = matches!(timeout(deadline, ack_rx).await, Ok(Ok(true)));
        DispatchAck {
            inverter_id,
            accepted,
        }
    }
}
