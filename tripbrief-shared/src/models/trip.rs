use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who the trip is being planned for. Drives persona-specific copy in
/// validation messages and in the generated brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    #[serde(alias = "New Traveler")]
    NewTraveler,
    #[serde(alias = "Experienced Traveler", alias = "Experienced")]
    ExperiencedTraveler,
    #[serde(alias = "Solo Female Traveler")]
    SoloFemaleTraveler,
    Minor,
    Family,
}

impl Persona {
    pub fn label(&self) -> &'static str {
        match self {
            Persona::NewTraveler => "New Traveler",
            Persona::ExperiencedTraveler => "Experienced Traveler",
            Persona::SoloFemaleTraveler => "Solo Female Traveler",
            Persona::Minor => "Minor",
            Persona::Family => "Family",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportCountry {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    Low,
    #[serde(rename = "Mid-range")]
    MidRange,
    Luxury,
}

impl Budget {
    pub fn label(&self) -> &'static str {
        match self {
            Budget::Low => "Low",
            Budget::MidRange => "Mid-range",
            Budget::Luxury => "Luxury",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub city_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub days_allocated: u32,
}

impl Destination {
    pub fn new(city_name: impl Into<String>, days_allocated: u32) -> Self {
        Self {
            city_name: city_name.into(),
            country: None,
            days_allocated,
        }
    }
}

/// A file attached to the draft. Held in memory only.
#[derive(Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The user's in-progress trip form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripDraft {
    pub persona: Option<Persona>,
    pub passport_country: Option<PassportCountry>,
    pub activity_preferences: BTreeSet<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub destinations: Vec<Destination>,
    pub group_size: Option<u8>,
    pub ages: Option<String>,
    pub budget: Option<Budget>,
    #[serde(skip)]
    pub uploads: Vec<Upload>,
    pub upload_keys: Vec<String>,
    pub parsed_booking_data: Option<serde_json::Value>,
}

impl TripDraft {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inclusive day count between the two dates, 0 when either is unset.
    pub fn trip_duration(&self) -> u32 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => {
                let days = (end - start).num_days() + 1;
                u32::try_from(days).unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn allocated_days(&self) -> u32 {
        self.destinations.iter().map(|d| d.days_allocated).sum()
    }

    /// Completeness check used to enable navigation. The duration ceiling
    /// is enforced separately at submission time.
    pub fn is_valid(&self) -> bool {
        let duration = self.trip_duration();
        self.persona.is_some()
            && self.passport_country.is_some()
            && self.start_date.is_some()
            && self.end_date.is_some()
            && !self.destinations.is_empty()
            && duration > 0
            && self.allocated_days() == duration
    }
}

/// Shallow partial update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripDraftPatch {
    pub persona: Option<Persona>,
    pub passport_country: Option<PassportCountry>,
    pub activity_preferences: Option<BTreeSet<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub destinations: Option<Vec<Destination>>,
    pub group_size: Option<u8>,
    pub ages: Option<String>,
    pub budget: Option<Budget>,
    #[serde(skip)]
    pub uploads: Option<Vec<Upload>>,
    pub upload_keys: Option<Vec<String>>,
    pub parsed_booking_data: Option<serde_json::Value>,
}

impl TripDraftPatch {
    pub fn apply(self, draft: &mut TripDraft) {
        if let Some(v) = self.persona {
            draft.persona = Some(v);
        }
        if let Some(v) = self.passport_country {
            draft.passport_country = Some(v);
        }
        if let Some(v) = self.activity_preferences {
            draft.activity_preferences = v;
        }
        if let Some(v) = self.start_date {
            draft.start_date = Some(v);
        }
        if let Some(v) = self.end_date {
            draft.end_date = Some(v);
        }
        if let Some(v) = self.destinations {
            draft.destinations = v;
        }
        if let Some(v) = self.group_size {
            draft.group_size = Some(v);
        }
        if let Some(v) = self.ages {
            draft.ages = Some(v);
        }
        if let Some(v) = self.budget {
            draft.budget = Some(v);
        }
        if let Some(v) = self.uploads {
            draft.uploads = v;
        }
        if let Some(v) = self.upload_keys {
            draft.upload_keys = v;
        }
        if let Some(v) = self.parsed_booking_data {
            draft.parsed_booking_data = Some(v);
        }
    }
}
