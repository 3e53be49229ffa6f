use crate::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Process lifecycle. `Ready` is terminal: availability is decided once at
/// startup and a failed model load needs a restart to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceState {
    Starting,
    Ready { model_available: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEvent {
    SessionInitialized,
    SessionFailed,
}

#[derive(Debug)]
pub struct ServiceStateMachine {
    state: ServiceState,
}

impl ServiceStateMachine {
    pub fn new() -> Self {
        Self {
            state: ServiceState::Starting,
        }
    }

    pub fn current_state(&self) -> ServiceState {
        self.state
    }

    pub fn transition(&mut self, event: ServiceEvent) -> Result<ServiceState> {
        let new_state = match (self.state, event) {
            (ServiceState::Starting, ServiceEvent::SessionInitialized) => ServiceState::Ready {
                model_available: true,
            },
            (ServiceState::Starting, ServiceEvent::SessionFailed) => ServiceState::Ready {
                model_available: false,
            },
            (state, event) => {
                warn!("Invalid service transition from {:?} with {:?}", state, event);
                return Err(Error::fsm(format!(
                    "Invalid transition from {:?} with event {:?}",
                    state, event
                )));
            }
        };

        info!(
            "Service state transition: {:?} -> {:?} (event: {:?})",
            self.state, new_state, event
        );
        self.state = new_state;
        Ok(new_state)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready { .. })
    }
}

impl Default for ServiceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
