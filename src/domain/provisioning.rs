//! Derivation of the provisioning mode of a console contract request.
//!
//! Everything here is a pure function of the current draft: the candidate list,
//! the reconciled target contract and the resulting mode are recomputed from
//! scratch on every change, so the decision table is evaluated in one place.

use serde::Serialize;
use thiserror::Error;

use crate::domain::client::Subscriber;
use crate::domain::contract::{Contract, ContractStatus};
use crate::domain::offer::Offer;
use crate::domain::types::{ClientId, ContractId};

/// Whether the request attaches to an existing contract or opens a new line.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningMode {
    Upgrade,
    NewLine,
    Ambiguous,
}

impl ProvisioningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::NewLine => "new_line",
            Self::Ambiguous => "ambiguous",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Upgrade => "Upgrade existing contract",
            Self::NewLine => "New line",
            Self::Ambiguous => "Ambiguous: choose a target contract",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error(
        "Several active contracts match this offer. Select a target contract or enter a new service identifier."
    )]
    Ambiguous,
}

/// Signals the decision table is evaluated on.
#[derive(Clone, Copy, Debug)]
pub struct ModeInputs<'a> {
    pub existing_client_flow: bool,
    pub has_new_service_identifier: bool,
    pub target_contract_id: Option<&'a ContractId>,
    pub candidate_count: usize,
}

/// Active contracts of `client_id` whose subscriber runs the same service type
/// as `offer`. Empty while either selection is missing.
pub fn upgrade_candidates<'a>(
    client_id: Option<&ClientId>,
    offer: Option<&Offer>,
    contracts: &'a [Contract],
    subscribers: &[Subscriber],
) -> Vec<&'a Contract> {
    let (Some(client_id), Some(offer)) = (client_id, offer) else {
        return Vec::new();
    };
    contracts
        .iter()
        .filter(|contract| {
            &contract.client_id == client_id && contract.status == ContractStatus::Active
        })
        .filter(|contract| {
            subscribers.iter().any(|subscriber| {
                subscriber.id == contract.subscriber_id
                    && subscriber.service_type == offer.service_type
            })
        })
        .collect()
}

/// First matching row wins.
pub fn detect_mode(inputs: &ModeInputs<'_>) -> ProvisioningMode {
    if !inputs.existing_client_flow {
        return ProvisioningMode::NewLine;
    }
    if inputs.has_new_service_identifier {
        return ProvisioningMode::NewLine;
    }
    if inputs.target_contract_id.is_some() {
        return ProvisioningMode::Upgrade;
    }
    match inputs.candidate_count {
        0 => ProvisioningMode::NewLine,
        1 => ProvisioningMode::Upgrade,
        _ => ProvisioningMode::Ambiguous,
    }
}

/// Keeps, auto-assigns or clears the target contract so it never goes stale.
pub fn reconcile_target(
    existing_client_flow: bool,
    has_new_service_identifier: bool,
    current: Option<&ContractId>,
    candidates: &[&Contract],
) -> Option<ContractId> {
    if !existing_client_flow || has_new_service_identifier {
        return None;
    }
    if let Some(current) = current.filter(|id| candidates.iter().any(|c| &c.id == *id)) {
        return Some(current.clone());
    }
    match candidates {
        [single] => Some(single.id.clone()),
        _ => None,
    }
}

/// Reconciled view of a provisioning draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub target_contract_id: Option<ContractId>,
    pub mode: ProvisioningMode,
}

impl Resolution {
    pub fn ensure_submittable(&self) -> Result<(), ProvisioningError> {
        match self.mode {
            ProvisioningMode::Ambiguous => Err(ProvisioningError::Ambiguous),
            _ => Ok(()),
        }
    }
}

/// Runs the target reconciliation, then the decision table on its result.
pub fn resolve(
    existing_client_flow: bool,
    new_service_identifier: &str,
    current_target: Option<&ContractId>,
    candidates: &[&Contract],
) -> Resolution {
    let has_new_service_identifier = !new_service_identifier.trim().is_empty();
    let target_contract_id = reconcile_target(
        existing_client_flow,
        has_new_service_identifier,
        current_target,
        candidates,
    );
    let mode = detect_mode(&ModeInputs {
        existing_client_flow,
        has_new_service_identifier,
        target_contract_id: target_contract_id.as_ref(),
        candidate_count: candidates.len(),
    });
    Resolution {
        target_contract_id,
        mode,
    }
}
