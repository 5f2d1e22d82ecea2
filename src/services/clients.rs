//! Clients tab: listing, status changes and deletion of customer records.

use crate::api::CustomerApi;
use crate::domain::client::{Client, ClientStatus};
use crate::domain::types::ClientId;
use crate::dto::console::ClientsPageData;
use crate::services::{ServiceResult, keep_or_first};

/// Loads the clients with the subscribers of the selected one (first by default).
pub async fn load_clients_page<R>(
    api: &R,
    selected: Option<ClientId>,
) -> ServiceResult<ClientsPageData>
where
    R: CustomerApi + ?Sized,
{
    let clients = api
        .list_customers()
        .await
        .map_err(|err| {
            log::error!("Failed to list clients: {err}");
            err
        })?
        .data;

    let ids: Vec<ClientId> = clients.iter().map(|client| client.id.clone()).collect();
    let selected_client_id = keep_or_first(selected, &ids);

    let subscribers = match &selected_client_id {
        Some(client_id) => {
            api.list_subscribers(client_id)
                .await
                .map_err(|err| {
                    log::error!("Failed to list subscribers of {client_id}: {err}");
                    err
                })?
                .data
        }
        None => Vec::new(),
    };

    Ok(ClientsPageData {
        clients,
        selected_client_id,
        subscribers,
    })
}

pub async fn update_client_status<R>(
    api: &R,
    client_id: &ClientId,
    status: ClientStatus,
) -> ServiceResult<Client>
where
    R: CustomerApi + ?Sized,
{
    let client = api
        .update_customer_status(client_id, status)
        .await
        .map_err(|err| {
            log::error!("Failed to update status of client {client_id}: {err}");
            err
        })?;
    Ok(client)
}

/// Deletes the client and returns the selection to keep afterwards.
pub async fn delete_client<R>(
    api: &R,
    client_id: &ClientId,
    selected: Option<ClientId>,
) -> ServiceResult<Option<ClientId>>
where
    R: CustomerApi + ?Sized,
{
    api.delete_customer(client_id).await.map_err(|err| {
        log::error!("Failed to delete client {client_id}: {err}");
        err
    })?;
    Ok(selected.filter(|id| id != client_id))
}
