use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::trip::{Budget, Destination, PassportCountry, Persona, TripDraft};
use crate::pii::Masked;

/// Plan recorded on the pending session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    Basic,
    #[serde(rename = "one_time")]
    OneTime,
    #[serde(rename = "yearly")]
    Yearly,
}

/// Plan selector sent to the checkout function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutPlan {
    Onetime,
    Yearly,
}

impl CheckoutPlan {
    pub fn plan_type(&self) -> PlanType {
        match self {
            CheckoutPlan::Onetime => PlanType::OneTime,
            CheckoutPlan::Yearly => PlanType::Yearly,
        }
    }

    /// Maps the payment processor's checkout `mode` back to a plan.
    pub fn from_mode(mode: &str) -> Self {
        if mode == "subscription" {
            CheckoutPlan::Yearly
        } else {
            CheckoutPlan::Onetime
        }
    }
}

pub const STATUS_PENDING: &str = "Pending";

/// Server-side record of one checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub persona: Option<Persona>,
    pub passport_country: Option<PassportCountry>,
    #[serde(default)]
    pub activity_preferences: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    pub group_size: Option<u8>,
    pub ages: Option<String>,
    pub budget: Option<Budget>,
    #[serde(default)]
    pub upload_keys: Vec<String>,
    pub parsed_booking_data: Option<serde_json::Value>,
    pub customer_email: Option<Masked<String>>,
    #[serde(default)]
    pub has_paid: bool,
    pub plan_type: PlanType,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: String,
    pub brief_id: Uuid,
}

impl PendingSession {
    /// Snapshot a draft. File blobs are dropped; upload keys are kept.
    pub fn from_draft(id: Uuid, brief_id: Uuid, draft: &TripDraft) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            persona: draft.persona,
            passport_country: draft.passport_country.clone(),
            activity_preferences: draft.activity_preferences.iter().cloned().collect(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            destinations: draft.destinations.clone(),
            group_size: draft.group_size,
            ages: draft.ages.clone(),
            budget: draft.budget,
            upload_keys: draft.upload_keys.clone(),
            parsed_booking_data: draft.parsed_booking_data.clone(),
            customer_email: None,
            has_paid: false,
            plan_type: PlanType::Basic,
            paid_at: None,
            status: STATUS_PENDING.to_string(),
            brief_id,
        }
    }

    /// Payment fields are the only ones that change after insertion.
    pub fn record_payment(&mut self, email: Option<String>, plan: PlanType, paid_at: DateTime<Utc>) {
        self.customer_email = email.map(Masked);
        self.plan_type = plan;
        self.has_paid = true;
        self.paid_at = Some(paid_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_draft() {
        let draft = TripDraft {
            persona: Some(Persona::Family),
            destinations: vec![Destination::new("Kyoto", 3)],
            upload_keys: vec!["k1".into()],
            ..TripDraft::empty()
        };
        let id = Uuid::new_v4();
        let brief_id = Uuid::new_v4();
        let session = PendingSession::from_draft(id, brief_id, &draft);

        assert_eq!(session.id, id);
        assert_eq!(session.brief_id, brief_id);
        assert_eq!(session.status, "Pending");
        assert!(!session.has_paid);
        assert_eq!(session.plan_type, PlanType::Basic);
        assert_eq!(session.upload_keys, vec!["k1".to_string()]);
    }

    #[test]
    fn test_plan_wire_names() {
        assert_eq!(serde_json::to_value(PlanType::OneTime).unwrap(), "one_time");
        assert_eq!(serde_json::to_value(CheckoutPlan::Onetime).unwrap(), "onetime");
        assert_eq!(CheckoutPlan::from_mode("subscription"), CheckoutPlan::Yearly);
        assert_eq!(CheckoutPlan::from_mode("payment").plan_type(), PlanType::OneTime);
    }

    #[test]
    fn test_email_is_masked_in_debug() {
        let mut session = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), &TripDraft::empty());
        session.record_payment(Some("ana@example.com".into()), PlanType::Yearly, Utc::now());
        let debug = format!("{:?}", session);
        assert!(!debug.contains("ana@example.com"));
        assert!(session.has_paid);
    }
}
