use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SessionCreatedEvent {
    pub pending_session_id: Uuid,
    pub brief_id: Uuid,
    pub persona: Option<String>,
    pub trip_duration: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentVerifiedEvent {
    pub pending_session_id: Option<Uuid>,
    pub has_paid: bool,
    pub mode: Option<String>,
    pub amount_total: Option<i64>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BriefGeneratedEvent {
    pub pending_session_id: Uuid,
    /// "structured" or "freeform"
    pub kind: String,
    pub defaults_applied: usize,
    pub timestamp: i64,
}
