//! Offers tab: catalog listing and the create/edit form.

use chrono::NaiveDate;

use crate::api::OfferApi;
use crate::domain::offer::{Offer, OfferStatus};
use crate::domain::types::OfferId;
use crate::dto::console::{OfferRow, OffersPageData};
use crate::forms::offers::OfferForm;
use crate::services::{ServiceError, ServiceResult};

async fn list_offers<R>(api: &R) -> ServiceResult<Vec<Offer>>
where
    R: OfferApi + ?Sized,
{
    let offers = api
        .list_offers()
        .await
        .map_err(|err| {
            log::error!("Failed to list offers: {err}");
            err
        })?
        .data;
    Ok(offers)
}

/// Loads the catalog with the form to show.
///
/// `edit` asks for an existing offer to be loaded into the form, unless the
/// session `draft` is already editing that offer. Without `edit` the draft is
/// shown as is, or a blank form when there is none.
pub async fn load_offers_page<R>(
    api: &R,
    draft: Option<OfferForm>,
    edit: Option<OfferId>,
    today: NaiveDate,
) -> ServiceResult<OffersPageData>
where
    R: OfferApi + ?Sized,
{
    let offers = list_offers(api).await?;

    let form = match (edit, draft) {
        (Some(offer_id), Some(draft)) if draft.editing_offer_id().as_ref() == Some(&offer_id) => {
            draft
        }
        (Some(offer_id), _) => offers
            .iter()
            .find(|offer| offer.id == offer_id)
            .map(OfferForm::from_offer)
            .ok_or(ServiceError::NotFound("Offer"))?,
        (None, Some(draft)) => draft,
        (None, None) => OfferForm::new(today),
    };

    Ok(OffersPageData {
        editing: form.editing_offer_id().is_some(),
        preview: form.preview(),
        form,
        offers: offers.into_iter().map(OfferRow::from).collect(),
    })
}

/// Creates the offer, or updates it with its current version in edit mode.
/// Returns the banner text.
pub async fn save_offer<R>(api: &R, form: OfferForm) -> ServiceResult<&'static str>
where
    R: OfferApi + ?Sized,
{
    match form.editing_offer_id() {
        Some(offer_id) => {
            let offers = list_offers(api).await?;
            let version = offers
                .iter()
                .find(|offer| offer.id == offer_id)
                .map(|offer| offer.version)
                .ok_or(ServiceError::NotFound("Offer"))?;
            let payload = form.into_payload(version)?;
            api.update_offer(&offer_id, &payload).await.map_err(|err| {
                log::error!("Failed to update offer {offer_id}: {err}");
                err
            })?;
            Ok("Offer updated.")
        }
        None => {
            let payload = form.into_payload(1)?;
            api.create_offer(&payload).await.map_err(|err| {
                log::error!("Failed to create offer: {err}");
                err
            })?;
            Ok("Offer created.")
        }
    }
}

pub async fn update_offer_status<R>(
    api: &R,
    offer_id: &OfferId,
    status: OfferStatus,
) -> ServiceResult<Offer>
where
    R: OfferApi + ?Sized,
{
    let offer = api
        .update_offer_status(offer_id, status)
        .await
        .map_err(|err| {
            log::error!("Failed to update status of offer {offer_id}: {err}");
            err
        })?;
    Ok(offer)
}

/// Deletes the offer. Returns whether the form was editing it and must be reset.
pub async fn delete_offer<R>(
    api: &R,
    offer_id: &OfferId,
    draft: Option<&OfferForm>,
) -> ServiceResult<bool>
where
    R: OfferApi + ?Sized,
{
    api.delete_offer(offer_id).await.map_err(|err| {
        log::error!("Failed to delete offer {offer_id}: {err}");
        err
    })?;
    Ok(draft.and_then(OfferForm::editing_offer_id).as_ref() == Some(offer_id))
}
