//! Contracts tab: provisioning draft resolution, provisioning and status changes.

use crate::api::{ContractApi, CustomerApi, OfferApi};
use crate::domain::client::{Client, Subscriber};
use crate::domain::contract::{Contract, ContractStatus};
use crate::domain::offer::Offer;
use crate::domain::provisioning::{self, Resolution};
use crate::domain::types::{ContractId, IdempotencyKey};
use crate::dto::console::{ContractRow, ContractsPageData, OfferRow};
use crate::forms::contracts::ProvisionForm;
use crate::services::ServiceResult;

/// Backend data the provisioning draft is resolved against.
struct Catalog {
    clients: Vec<Client>,
    offers: Vec<Offer>,
    contracts: Vec<Contract>,
    subscribers: Vec<Subscriber>,
}

async fn load_catalog<R>(api: &R, draft: &ProvisionForm) -> ServiceResult<Catalog>
where
    R: CustomerApi + OfferApi + ContractApi + ?Sized,
{
    let (clients, offers, contracts) =
        tokio::try_join!(api.list_customers(), api.list_offers(), api.list_contracts()).map_err(
            |err| {
                log::error!("Failed to load contracts data: {err}");
                err
            },
        )?;

    // Candidates only ever belong to the selected existing client.
    let subscribers = match draft.client_id().filter(|_| draft.existing_client_flow()) {
        Some(client_id) => {
            api.list_subscribers(&client_id)
                .await
                .map_err(|err| {
                    log::error!("Failed to list subscribers of {client_id}: {err}");
                    err
                })?
                .data
        }
        None => Vec::new(),
    };

    Ok(Catalog {
        clients: clients.data,
        offers: offers.data,
        contracts: contracts.data,
        subscribers,
    })
}

fn resolve_draft<'a>(catalog: &'a Catalog, draft: &ProvisionForm) -> (Vec<&'a Contract>, Resolution) {
    let offer_id = draft.offer_id();
    let offer = catalog
        .offers
        .iter()
        .find(|offer| Some(&offer.id) == offer_id.as_ref());
    let client_id = draft.client_id();
    let candidates = provisioning::upgrade_candidates(
        client_id.as_ref(),
        offer,
        &catalog.contracts,
        &catalog.subscribers,
    );
    let resolution = provisioning::resolve(
        draft.existing_client_flow(),
        &draft.new_service_identifier,
        draft.target_contract_id().as_ref(),
        &candidates,
    );
    (candidates, resolution)
}

fn store_target(draft: &mut ProvisionForm, target: Option<&ContractId>) {
    draft.target_contract_id = target.map(ToString::to_string).unwrap_or_default();
}

/// Loads the tab and re-derives the draft's target contract and mode.
pub async fn load_contracts_page<R>(
    api: &R,
    mut draft: ProvisionForm,
) -> ServiceResult<ContractsPageData>
where
    R: CustomerApi + OfferApi + ContractApi + ?Sized,
{
    let catalog = load_catalog(api, &draft).await?;
    let (candidates, resolution) = resolve_draft(&catalog, &draft);
    store_target(&mut draft, resolution.target_contract_id.as_ref());

    let candidates = candidates
        .into_iter()
        .map(|contract| ContractRow::new(contract.clone(), &catalog.clients, &catalog.offers))
        .collect();

    let mut contracts = catalog.contracts.clone();
    contracts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let contracts = contracts
        .into_iter()
        .map(|contract| ContractRow::new(contract, &catalog.clients, &catalog.offers))
        .collect();

    Ok(ContractsPageData {
        offers: catalog.offers.into_iter().map(OfferRow::from).collect(),
        clients: catalog.clients,
        contracts,
        draft,
        candidates,
        mode: resolution.mode,
        mode_label: resolution.mode.label(),
    })
}

/// Validates the draft, provisions the contract and clears the line inputs.
/// Returns the banner text.
pub async fn provision_contract<R>(api: &R, draft: &mut ProvisionForm) -> ServiceResult<String>
where
    R: CustomerApi + OfferApi + ContractApi + ?Sized,
{
    draft.check_selection()?;

    let catalog = load_catalog(api, draft).await?;
    let (_, resolution) = resolve_draft(&catalog, draft);
    store_target(draft, resolution.target_contract_id.as_ref());
    resolution.ensure_submittable()?;

    let request = draft.build_request(resolution.target_contract_id)?;
    let result = api
        .provision_contract(&request, &IdempotencyKey::generate("contract-provision"))
        .await
        .map_err(|err| {
            log::error!("Failed to provision contract: {err}");
            err
        })?;

    draft.clear_after_provision();
    Ok(result.summary())
}

pub async fn update_contract_status<R>(
    api: &R,
    contract_id: &ContractId,
    status: ContractStatus,
) -> ServiceResult<Contract>
where
    R: ContractApi + ?Sized,
{
    let contract = api
        .update_contract_status(contract_id, status)
        .await
        .map_err(|err| {
            log::error!("Failed to update status of contract {contract_id}: {err}");
            err
        })?;
    Ok(contract)
}
