//! Client portal flows as an explicit state machine.
//!
//! The whole wizard is a serializable value kept in the visitor's session.
//! Steps only move forward through the transition methods below, which
//! validate their inputs first, and `back` always returns to the
//! immediately preceding step without discarding what was entered.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::landing::{
    CinVerification, LineNumberRequest, LookupSubscription, MobileNumberMode,
    NewSubscriptionRequest, OfferSummary, PlanChangeRequest, SubmitResponse, SubscriptionsLookup,
};
use crate::domain::offer::ServiceCategory;
use crate::domain::phone::{self, LineKind, NormalizedNumber};
use crate::domain::types::{Cin, ContractId, LookupToken, OfferId};

const DEFAULT_COMMITMENT_MONTHS: &str = "12";
const MAX_COMMITMENT_MONTHS: u32 = 60;
const MIN_FULL_NAME_LEN: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("Select an offer before continuing.")]
    OfferRequired,
    #[error("CIN and full name are required.")]
    IdentityRequired,
    #[error("Please provide a valid Moroccan mobile number in the phone field.")]
    InvalidMobile,
    #[error("Enter a valid CIN.")]
    InvalidCin,
    #[error("Select a source contract and target offer.")]
    PlanSelectionRequired,
    #[error("Selected offer is missing. Go back and reselect.")]
    OfferMissing,
    #[error("Commitment must be between 1 and 60 months.")]
    InvalidCommitment,
    #[error("Verify your CIN before continuing.")]
    NotVerified,
    #[error("This step is not available right now. Start the flow again.")]
    StepUnavailable,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    SubscribeNewService,
    UpgradeOrDowngradeExistingService,
    CheckBillingAndDownloadInvoices,
}

impl Flow {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "subscribe_new_service" => Some(Self::SubscribeNewService),
            "upgrade_or_downgrade_existing_service" => Some(Self::UpgradeOrDowngradeExistingService),
            "check_billing_and_download_invoices" => Some(Self::CheckBillingAndDownloadInvoices),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewStep {
    Offer,
    Phone,
    Identity,
    Preview,
    Done,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanStep {
    Cin,
    Offer,
    Preview,
    Done,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingStep {
    Verify,
    Invoices,
}

/// Proof that the backend accepted a CIN; required before any account data is shown.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verified {
    pub cin: Cin,
    pub masked_contact: String,
    pub lookup_token: LookupToken,
}

impl Verified {
    pub fn new(cin: Cin, verification: CinVerification) -> Self {
        Self {
            cin,
            masked_contact: verification.masked_contact,
            lookup_token: verification.lookup_token,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityDetails {
    pub cin: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
}

/// Identity step input as posted by the visitor.
#[derive(Clone, Debug, Default)]
pub struct IdentityInput {
    pub details: IdentityDetails,
    pub existing_mobile_input: Option<String>,
    pub start_date: NaiveDate,
    pub commitment_months: String,
}

fn parse_commitment(value: &str) -> Result<Option<u32>, WizardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<u32>() {
        Ok(months) if (1..=MAX_COMMITMENT_MONTHS).contains(&months) => Ok(Some(months)),
        _ => Err(WizardError::InvalidCommitment),
    }
}

/// Parses a visitor-typed CIN for verification.
pub fn parse_cin(raw: &str) -> Result<Cin, WizardError> {
    Cin::new(raw).map_err(|_| WizardError::InvalidCin)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewSubscription {
    pub step: NewStep,
    pub service: ServiceCategory,
    pub offer_id: Option<OfferId>,
    pub mobile_mode: MobileNumberMode,
    pub existing_mobile_input: String,
    pub generated_mobile_nsn: String,
    pub generated_landline_nsn: String,
    pub identity: IdentityDetails,
    pub start_date: NaiveDate,
    pub commitment_months: String,
    pub result: Option<SubmitResponse>,
}

impl NewSubscription {
    fn new<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Self {
        Self {
            step: NewStep::Offer,
            service: ServiceCategory::Mobile,
            offer_id: None,
            mobile_mode: MobileNumberMode::AssignNew,
            existing_mobile_input: String::new(),
            generated_mobile_nsn: phone::random_nsn(rng, LineKind::Mobile),
            generated_landline_nsn: phone::random_nsn(rng, LineKind::Landline),
            identity: IdentityDetails::default(),
            start_date: today,
            commitment_months: DEFAULT_COMMITMENT_MONTHS.to_string(),
            result: None,
        }
    }

    fn expect_step(&self, step: NewStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::StepUnavailable)
        }
    }

    fn is_mobile(&self) -> bool {
        self.service == ServiceCategory::Mobile
    }

    /// Switching service drops the previously picked offer.
    pub fn select_service(&mut self, service: ServiceCategory) -> Result<(), WizardError> {
        self.expect_step(NewStep::Offer)?;
        if self.service != service {
            self.service = service;
            self.offer_id = None;
        }
        Ok(())
    }

    pub fn continue_from_offer(&mut self, offer_id: Option<OfferId>) -> Result<(), WizardError> {
        self.expect_step(NewStep::Offer)?;
        let offer_id = offer_id.ok_or(WizardError::OfferRequired)?;
        self.offer_id = Some(offer_id);
        self.step = if self.is_mobile() {
            NewStep::Phone
        } else {
            NewStep::Identity
        };
        Ok(())
    }

    /// Picking "assign new" always draws a fresh number.
    pub fn choose_mobile_mode<R: Rng + ?Sized>(
        &mut self,
        mode: MobileNumberMode,
        rng: &mut R,
    ) -> Result<(), WizardError> {
        self.expect_step(NewStep::Phone)?;
        self.mobile_mode = mode;
        if mode == MobileNumberMode::AssignNew {
            self.generated_mobile_nsn = phone::random_nsn(rng, LineKind::Mobile);
        }
        Ok(())
    }

    pub fn continue_from_phone(&mut self) -> Result<(), WizardError> {
        self.expect_step(NewStep::Phone)?;
        self.step = NewStep::Identity;
        Ok(())
    }

    /// Stores the identity form; entered values are kept even when validation fails.
    pub fn continue_from_identity(&mut self, input: IdentityInput) -> Result<(), WizardError> {
        self.expect_step(NewStep::Identity)?;
        self.identity = input.details;
        if let Some(existing) = input.existing_mobile_input {
            self.existing_mobile_input = existing;
        }
        self.start_date = input.start_date;
        self.commitment_months = input.commitment_months;

        if self.identity.cin.trim().chars().count() < Cin::MIN_LEN
            || self.identity.full_name.trim().chars().count() < MIN_FULL_NAME_LEN
        {
            return Err(WizardError::IdentityRequired);
        }
        if self.is_mobile()
            && self.mobile_mode == MobileNumberMode::UseExisting
            && self.normalized_existing_mobile().is_none()
        {
            return Err(WizardError::InvalidMobile);
        }
        parse_commitment(&self.commitment_months)?;
        self.step = NewStep::Preview;
        Ok(())
    }

    pub fn normalized_existing_mobile(&self) -> Option<NormalizedNumber> {
        phone::normalize_moroccan_number(&self.existing_mobile_input, LineKind::Mobile).ok()
    }

    /// Line identifier shown on the validation step.
    pub fn preview_identifier(&self) -> String {
        match (self.is_mobile(), self.mobile_mode) {
            (true, MobileNumberMode::AssignNew) => phone::canonical(&self.generated_mobile_nsn),
            (true, MobileNumberMode::UseExisting) => self
                .normalized_existing_mobile()
                .map(|n| n.canonical)
                .unwrap_or_else(|| self.existing_mobile_input.clone()),
            (false, _) => phone::canonical(&self.generated_landline_nsn),
        }
    }

    /// Builds the submission body; `offer` is the catalog entry for `offer_id`.
    pub fn build_request(
        &self,
        offer: Option<&OfferSummary>,
    ) -> Result<NewSubscriptionRequest, WizardError> {
        self.expect_step(NewStep::Preview)?;
        let offer = offer
            .filter(|o| self.offer_id.as_ref() == Some(&o.id))
            .ok_or(WizardError::OfferMissing)?;
        let cin = parse_cin(&self.identity.cin).map_err(|_| WizardError::IdentityRequired)?;

        let (contact_phone, line) = if self.is_mobile() {
            match self.mobile_mode {
                MobileNumberMode::AssignNew => (
                    Some(phone::canonical(&self.generated_mobile_nsn)),
                    LineNumberRequest::NewMobile {
                        mobile_number_mode: MobileNumberMode::AssignNew,
                        requested_mobile_local_number: self.generated_mobile_nsn.clone(),
                    },
                ),
                MobileNumberMode::UseExisting => {
                    let normalized = self.normalized_existing_mobile();
                    let nsn = normalized
                        .as_ref()
                        .map(|n| n.nsn.clone())
                        .unwrap_or_else(|| self.existing_mobile_input.trim().to_string());
                    (
                        normalized.map(|n| n.canonical),
                        LineNumberRequest::ExistingMobile {
                            mobile_number_mode: MobileNumberMode::UseExisting,
                            existing_mobile_local_number: nsn,
                        },
                    )
                }
            }
        } else {
            (
                Some(phone::canonical(&self.generated_landline_nsn)),
                LineNumberRequest::HomeLandline {
                    home_landline_local_number: self.generated_landline_nsn.clone(),
                },
            )
        };

        Ok(NewSubscriptionRequest {
            service_category: self.service,
            offer_id: offer.id.clone(),
            cin,
            full_name: self.identity.full_name.trim().to_string(),
            email: non_blank(&self.identity.email),
            address: non_blank(&self.identity.address),
            contact_phone,
            contract_start_date: self.start_date,
            commitment_months: parse_commitment(&self.commitment_months)?,
            line,
        })
    }

    pub fn complete(&mut self, result: SubmitResponse) -> Result<(), WizardError> {
        self.expect_step(NewStep::Preview)?;
        self.result = Some(result);
        self.step = NewStep::Done;
        Ok(())
    }

    fn back(&mut self) -> bool {
        self.step = match self.step {
            NewStep::Offer => return false,
            NewStep::Phone => NewStep::Offer,
            NewStep::Identity if self.is_mobile() => NewStep::Phone,
            NewStep::Identity => NewStep::Offer,
            NewStep::Preview => NewStep::Identity,
            NewStep::Done => return false,
        };
        true
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanChange {
    pub step: PlanStep,
    pub lookup_cin: String,
    pub verified: Option<Verified>,
    pub source_contract_id: Option<ContractId>,
    pub target_offer_id: Option<OfferId>,
    pub start_date: NaiveDate,
    pub commitment_months: String,
    pub result: Option<SubmitResponse>,
}

impl PlanChange {
    fn new(today: NaiveDate) -> Self {
        Self {
            step: PlanStep::Cin,
            lookup_cin: String::new(),
            verified: None,
            source_contract_id: None,
            target_offer_id: None,
            start_date: today,
            commitment_months: DEFAULT_COMMITMENT_MONTHS.to_string(),
            result: None,
        }
    }

    fn expect_step(&self, step: PlanStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::StepUnavailable)
        }
    }

    /// Lookup token holder; absent until the CIN has been verified.
    pub fn verification(&self) -> Option<&Verified> {
        self.verified.as_ref()
    }

    pub fn verify_input(&mut self, raw_cin: &str) -> Result<Cin, WizardError> {
        self.expect_step(PlanStep::Cin)?;
        self.lookup_cin = raw_cin.trim().to_string();
        parse_cin(raw_cin)
    }

    pub fn verified(&mut self, verified: Verified) -> Result<(), WizardError> {
        self.expect_step(PlanStep::Cin)?;
        self.verified = Some(verified);
        self.source_contract_id = None;
        self.target_offer_id = None;
        self.step = PlanStep::Offer;
        Ok(())
    }

    /// Picking another source contract resets the target offer.
    pub fn select_source(&mut self, contract_id: Option<ContractId>) -> Result<(), WizardError> {
        self.expect_step(PlanStep::Offer)?;
        if self.verified.is_none() {
            return Err(WizardError::NotVerified);
        }
        if self.source_contract_id != contract_id {
            self.source_contract_id = contract_id;
            self.target_offer_id = None;
        }
        Ok(())
    }

    pub fn continue_from_offer(
        &mut self,
        lookup: &SubscriptionsLookup,
        source: Option<ContractId>,
        target: Option<OfferId>,
    ) -> Result<(), WizardError> {
        self.select_source(source)?;
        self.target_offer_id = target;
        self.selection(lookup)?;
        self.step = PlanStep::Preview;
        Ok(())
    }

    /// Current subscription and eligible target offer picked by the visitor.
    pub fn selection<'a>(
        &self,
        lookup: &'a SubscriptionsLookup,
    ) -> Result<(&'a LookupSubscription, &'a OfferSummary), WizardError> {
        let source = self
            .source_contract_id
            .as_ref()
            .and_then(|id| lookup.subscription(id))
            .ok_or(WizardError::PlanSelectionRequired)?;
        let target = self
            .target_offer_id
            .as_ref()
            .and_then(|id| source.eligible_offers.iter().find(|o| &o.id == id))
            .ok_or(WizardError::PlanSelectionRequired)?;
        Ok((source, target))
    }

    pub fn build_request(
        &mut self,
        lookup: &SubscriptionsLookup,
        start_date: NaiveDate,
        commitment_months: String,
    ) -> Result<PlanChangeRequest, WizardError> {
        self.expect_step(PlanStep::Preview)?;
        self.start_date = start_date;
        self.commitment_months = commitment_months;
        let (source, target) = self.selection(lookup)?;
        Ok(PlanChangeRequest {
            cin: lookup.client.cin.clone(),
            source_contract_id: source.contract_id.clone(),
            target_offer_id: target.id.clone(),
            contract_start_date: self.start_date,
            commitment_months: parse_commitment(&self.commitment_months)?,
        })
    }

    pub fn complete(&mut self, result: SubmitResponse) -> Result<(), WizardError> {
        self.expect_step(PlanStep::Preview)?;
        self.result = Some(result);
        self.step = PlanStep::Done;
        Ok(())
    }

    fn back(&mut self) -> bool {
        self.step = match self.step {
            PlanStep::Cin | PlanStep::Done => return false,
            PlanStep::Offer => PlanStep::Cin,
            PlanStep::Preview => PlanStep::Offer,
        };
        true
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BillingCheck {
    pub step: BillingStep,
    pub cin: String,
    pub verified: Option<Verified>,
}

impl BillingCheck {
    pub fn verify_input(&mut self, raw_cin: &str) -> Result<Cin, WizardError> {
        if self.step != BillingStep::Verify {
            return Err(WizardError::StepUnavailable);
        }
        self.cin = raw_cin.trim().to_string();
        parse_cin(raw_cin)
    }

    pub fn verified(&mut self, verified: Verified) -> Result<(), WizardError> {
        if self.step != BillingStep::Verify {
            return Err(WizardError::StepUnavailable);
        }
        self.verified = Some(verified);
        self.step = BillingStep::Invoices;
        Ok(())
    }

    fn back(&mut self) -> bool {
        match self.step {
            BillingStep::Verify => false,
            BillingStep::Invoices => {
                self.step = BillingStep::Verify;
                true
            }
        }
    }
}

/// The portal as a whole: flow picker or one active flow.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum PortalWizard {
    #[default]
    Picker,
    SubscribeNewService(NewSubscription),
    UpgradeOrDowngradeExistingService(PlanChange),
    CheckBillingAndDownloadInvoices(BillingCheck),
}

impl PortalWizard {
    /// Starts `flow` from its first step with every field reset.
    pub fn start<R: Rng + ?Sized>(flow: Flow, today: NaiveDate, rng: &mut R) -> Self {
        match flow {
            Flow::SubscribeNewService => {
                Self::SubscribeNewService(NewSubscription::new(today, rng))
            }
            Flow::UpgradeOrDowngradeExistingService => {
                Self::UpgradeOrDowngradeExistingService(PlanChange::new(today))
            }
            Flow::CheckBillingAndDownloadInvoices => {
                Self::CheckBillingAndDownloadInvoices(BillingCheck {
                    step: BillingStep::Verify,
                    cin: String::new(),
                    verified: None,
                })
            }
        }
    }

    pub fn flow(&self) -> Option<Flow> {
        match self {
            Self::Picker => None,
            Self::SubscribeNewService(_) => Some(Flow::SubscribeNewService),
            Self::UpgradeOrDowngradeExistingService(_) => {
                Some(Flow::UpgradeOrDowngradeExistingService)
            }
            Self::CheckBillingAndDownloadInvoices(_) => Some(Flow::CheckBillingAndDownloadInvoices),
        }
    }

    /// Steps back once; leaving the first step of a flow returns to the picker.
    pub fn back(&mut self) {
        let moved = match self {
            Self::Picker => true,
            Self::SubscribeNewService(state) => state.back(),
            Self::UpgradeOrDowngradeExistingService(state) => state.back(),
            Self::CheckBillingAndDownloadInvoices(state) => state.back(),
        };
        if !moved {
            *self = Self::Picker;
        }
    }

    pub fn exit(&mut self) {
        *self = Self::Picker;
    }

    pub fn new_subscription_mut(&mut self) -> Result<&mut NewSubscription, WizardError> {
        match self {
            Self::SubscribeNewService(state) => Ok(state),
            _ => Err(WizardError::StepUnavailable),
        }
    }

    pub fn plan_change_mut(&mut self) -> Result<&mut PlanChange, WizardError> {
        match self {
            Self::UpgradeOrDowngradeExistingService(state) => Ok(state),
            _ => Err(WizardError::StepUnavailable),
        }
    }

    pub fn billing_check_mut(&mut self) -> Result<&mut BillingCheck, WizardError> {
        match self {
            Self::CheckBillingAndDownloadInvoices(state) => Ok(state),
            _ => Err(WizardError::StepUnavailable),
        }
    }

    /// Result of a finished submission, whichever flow produced it.
    pub fn finished_result_mut(&mut self) -> Result<&mut SubmitResponse, WizardError> {
        match self {
            Self::SubscribeNewService(NewSubscription {
                step: NewStep::Done,
                result: Some(result),
                ..
            }) => Ok(result),
            Self::UpgradeOrDowngradeExistingService(PlanChange {
                step: PlanStep::Done,
                result: Some(result),
                ..
            }) => Ok(result),
            _ => Err(WizardError::StepUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::landing::{ContractRef, LookupClient};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn offer(id: &str, category: ServiceCategory) -> OfferSummary {
        OfferSummary {
            id: OfferId::new(id).unwrap(),
            name: format!("Offer {id}"),
            service_category: category,
            service_type: category.as_str().to_string(),
            monthly_fee: "99.00".to_string(),
            activation_fee: "0.00".to_string(),
        }
    }

    fn identity(cin: &str, name: &str) -> IdentityInput {
        IdentityInput {
            details: IdentityDetails {
                cin: cin.to_string(),
                full_name: name.to_string(),
                email: " ".to_string(),
                address: "Rabat".to_string(),
            },
            existing_mobile_input: None,
            start_date: today(),
            commitment_months: "12".to_string(),
        }
    }

    fn new_flow() -> PortalWizard {
        let mut rng = StdRng::seed_from_u64(1);
        PortalWizard::start(Flow::SubscribeNewService, today(), &mut rng)
    }

    #[test]
    fn mobile_flow_walks_through_phone_step() {
        let mut wizard = new_flow();
        let state = wizard.new_subscription_mut().unwrap();
        assert_eq!(state.continue_from_offer(None), Err(WizardError::OfferRequired));
        state.continue_from_offer(Some(OfferId::new("o-1").unwrap())).unwrap();
        assert_eq!(state.step, NewStep::Phone);
        state.continue_from_phone().unwrap();
        assert_eq!(state.step, NewStep::Identity);
        assert_eq!(
            state.continue_from_identity(identity("ab1", "Amina")),
            Err(WizardError::IdentityRequired)
        );
        state.continue_from_identity(identity("ab1234", "Amina Alaoui")).unwrap();
        assert_eq!(state.step, NewStep::Preview);

        let request = state
            .build_request(Some(&offer("o-1", ServiceCategory::Mobile)))
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["cin"], "AB1234");
        assert_eq!(json["mobile_number_mode"], "assign_new");
        assert_eq!(json["requested_mobile_local_number"], state.generated_mobile_nsn);
        assert_eq!(json["contact_phone"], format!("+212{}", state.generated_mobile_nsn));
        assert!(json["email"].is_null());
        assert_eq!(json["commitment_months"], 12);
    }

    #[test]
    fn internet_flow_skips_phone_step_both_ways() {
        let mut wizard = new_flow();
        let state = wizard.new_subscription_mut().unwrap();
        state.select_service(ServiceCategory::Internet).unwrap();
        state.continue_from_offer(Some(OfferId::new("o-2").unwrap())).unwrap();
        assert_eq!(state.step, NewStep::Identity);
        wizard.back();
        let state = wizard.new_subscription_mut().unwrap();
        assert_eq!(state.step, NewStep::Offer);
        assert_eq!(state.offer_id, Some(OfferId::new("o-2").unwrap()));
    }

    #[test]
    fn existing_mobile_must_normalize() {
        let mut wizard = new_flow();
        let mut rng = StdRng::seed_from_u64(2);
        let state = wizard.new_subscription_mut().unwrap();
        state.continue_from_offer(Some(OfferId::new("o-1").unwrap())).unwrap();
        state
            .choose_mobile_mode(MobileNumberMode::UseExisting, &mut rng)
            .unwrap();
        state.continue_from_phone().unwrap();

        let mut input = identity("AB1234", "Amina Alaoui");
        input.existing_mobile_input = Some("0522 12 34 56".to_string());
        assert_eq!(
            state.continue_from_identity(input.clone()),
            Err(WizardError::InvalidMobile)
        );
        assert_eq!(state.existing_mobile_input, "0522 12 34 56");

        input.existing_mobile_input = Some("06 55 33 44 22".to_string());
        state.continue_from_identity(input).unwrap();
        assert_eq!(state.preview_identifier(), "+212655334422");
        let request = state
            .build_request(Some(&offer("o-1", ServiceCategory::Mobile)))
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["existing_mobile_local_number"], "655334422");
    }

    #[test]
    fn mismatched_offer_is_reported_missing() {
        let mut wizard = new_flow();
        let state = wizard.new_subscription_mut().unwrap();
        state.select_service(ServiceCategory::Landline).unwrap();
        state.continue_from_offer(Some(OfferId::new("o-3").unwrap())).unwrap();
        state.continue_from_identity(identity("AB1234", "Amina Alaoui")).unwrap();
        assert_eq!(state.build_request(None), Err(WizardError::OfferMissing));
        let request = state
            .build_request(Some(&offer("o-3", ServiceCategory::Landline)))
            .unwrap();
        assert!(matches!(request.line, LineNumberRequest::HomeLandline { .. }));
    }

    #[test]
    fn back_from_first_step_returns_to_picker() {
        let mut wizard = new_flow();
        wizard.back();
        assert_eq!(wizard, PortalWizard::Picker);
    }

    #[test]
    fn plan_change_requires_verification_before_selection() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut wizard =
            PortalWizard::start(Flow::UpgradeOrDowngradeExistingService, today(), &mut rng);
        let state = wizard.plan_change_mut().unwrap();
        assert_eq!(state.verify_input("ab"), Err(WizardError::InvalidCin));
        assert_eq!(
            state.select_source(Some(ContractId::new("c-1").unwrap())),
            Err(WizardError::StepUnavailable)
        );

        let cin = state.verify_input("ab1234").unwrap();
        state
            .verified(Verified {
                cin,
                masked_contact: "a***@x.ma".to_string(),
                lookup_token: LookupToken::new("tok").unwrap(),
            })
            .unwrap();
        assert_eq!(state.step, PlanStep::Offer);

        let lookup = SubscriptionsLookup {
            client: LookupClient {
                cin: "AB1234".to_string(),
                full_name: "Amina Alaoui".to_string(),
                email: None,
                phone: None,
                address: None,
            },
            subscriptions: vec![LookupSubscription {
                contract_id: ContractId::new("c-1").unwrap(),
                service_identifier: "+212612345678".to_string(),
                service_category: ServiceCategory::Mobile,
                current_offer: offer("o-1", ServiceCategory::Mobile),
                eligible_offers: vec![offer("o-2", ServiceCategory::Mobile)],
            }],
        };
        assert_eq!(
            state.continue_from_offer(&lookup, Some(ContractId::new("c-1").unwrap()), None),
            Err(WizardError::PlanSelectionRequired)
        );
        state
            .continue_from_offer(
                &lookup,
                Some(ContractId::new("c-1").unwrap()),
                Some(OfferId::new("o-2").unwrap()),
            )
            .unwrap();
        let request = state.build_request(&lookup, today(), String::new()).unwrap();
        assert_eq!(request.target_offer_id.as_str(), "o-2");
        assert_eq!(request.commitment_months, None);

        state
            .complete(SubmitResponse {
                contract: ContractRef {
                    id: ContractId::new("c-9").unwrap(),
                },
                client_cin: "AB1234".to_string(),
                service_identifier: "+212612345678".to_string(),
                provisioning_mode: "upgrade_existing_contract".to_string(),
                document_download_url: None,
            })
            .unwrap();
        assert!(wizard.finished_result_mut().is_ok());
    }

    #[test]
    fn wizard_survives_session_round_trip() {
        let wizard = new_flow();
        let stored = serde_json::to_string(&wizard).unwrap();
        let restored: PortalWizard = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, wizard);
        assert_eq!(restored.flow(), Some(Flow::SubscribeNewService));
    }
}
