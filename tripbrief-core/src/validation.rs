use chrono::NaiveDate;
use serde::Serialize;

use tripbrief_shared::{Persona, TripDraft};

/// Longest trip a brief is generated for.
pub const MAX_TRIP_DAYS: u32 = 21;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Ceiling warning, worded for the traveler it is shown to.
pub fn duration_limit_message(persona: Option<Persona>, max_days: u32) -> String {
    match persona {
        Some(Persona::NewTraveler) => format!(
            "First trips work best when they stay focused. Please keep your trip to {} days or fewer.",
            max_days
        ),
        Some(Persona::ExperiencedTraveler) => format!(
            "Travel briefs cover up to {} days. Please split longer journeys into separate trips.",
            max_days
        ),
        Some(Persona::SoloFemaleTraveler) => format!(
            "We plan solo trips up to {} days at a time so safety guidance stays current. Please shorten your trip.",
            max_days
        ),
        Some(Persona::Minor) => format!(
            "Trips for travelers under 18 are limited to {} days. Please shorten your trip.",
            max_days
        ),
        Some(Persona::Family) => format!(
            "Family trips are limited to {} days so the plan stays manageable for everyone. Please shorten your trip.",
            max_days
        ),
        None => format!("Trips are limited to {} days. Please shorten your trip.", max_days),
    }
}

/// Checks run right before a pending session is created. Every failing
/// check is reported, in a fixed order.
pub fn validate_submission(draft: &TripDraft, today: NaiveDate, max_days: u32) -> ValidationReport {
    let mut report = ValidationReport::default();

    if draft.persona.is_none() {
        report.push("Please select who you are traveling as.");
    }
    if draft.passport_country.is_none() {
        report.push("Please select your passport country.");
    }

    match draft.start_date {
        None => report.push("Please select a start date."),
        Some(start) if start < today => report.push("Start date cannot be in the past."),
        Some(_) => {}
    }

    match (draft.start_date, draft.end_date) {
        (_, None) => report.push("Please select an end date."),
        (Some(start), Some(end)) if end < start => {
            report.push("End date must be on or after the start date.")
        }
        _ => {}
    }

    let duration = draft.trip_duration();
    if duration > max_days {
        report.push(duration_limit_message(draft.persona, max_days));
    }

    if draft.destinations.is_empty() {
        report.push("Please add at least one destination.");
    } else if duration > 0 && draft.allocated_days() != duration {
        report.push(format!(
            "Your trip is {} days long but you have allocated {} days across destinations. Please make them match.",
            duration,
            draft.allocated_days()
        ));
    }

    report
}

/// Lighter checks run before moving between form steps.
pub fn validate_local(draft: &TripDraft) -> ValidationReport {
    let mut report = ValidationReport::default();

    if draft.persona.is_none() {
        report.push("Traveler type is required");
    }
    if draft.passport_country.is_none() {
        report.push("Passport country is required");
    }
    if draft.start_date.is_none() || draft.end_date.is_none() {
        report.push("Travel dates are required");
    } else if draft.trip_duration() == 0 {
        report.push("End date cannot be before start date");
    }
    if draft.destinations.is_empty() {
        report.push("Add at least one destination");
    } else if draft.destinations.iter().any(|d| d.days_allocated == 0) {
        report.push("Every destination needs at least one day");
    } else if draft.trip_duration() > 0 && draft.allocated_days() != draft.trip_duration() {
        report.push(format!(
            "Days allocated ({}) do not match trip length ({})",
            draft.allocated_days(),
            draft.trip_duration()
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripbrief_shared::{Destination, PassportCountry};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2025-05-01")
    }

    fn complete_draft() -> TripDraft {
        TripDraft {
            persona: Some(Persona::ExperiencedTraveler),
            passport_country: Some(PassportCountry { code: "CA".into(), label: "Canada".into() }),
            start_date: Some(date("2025-06-01")),
            end_date: Some(date("2025-06-07")),
            destinations: vec![Destination::new("Paris", 4), Destination::new("Lyon", 3)],
            ..TripDraft::empty()
        }
    }

    #[test]
    fn test_complete_draft_passes() {
        let report = validate_submission(&complete_draft(), today(), MAX_TRIP_DAYS);
        assert!(report.is_ok(), "{:?}", report.errors);
        assert!(validate_local(&complete_draft()).is_ok());
    }

    #[test]
    fn test_allocation_mismatch_names_both_numbers() {
        let mut draft = complete_draft();
        draft.destinations = vec![Destination::new("Paris", 3), Destination::new("Lyon", 2)];

        let report = validate_submission(&draft, today(), MAX_TRIP_DAYS);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains('7'));
        assert!(report.errors[0].contains('5'));
    }

    #[test]
    fn test_family_ceiling_message() {
        let mut draft = complete_draft();
        draft.persona = Some(Persona::Family);
        draft.start_date = Some(date("2025-01-01"));
        draft.end_date = Some(date("2025-02-01"));
        draft.destinations = vec![Destination::new("Lisbon", 32)];
        assert_eq!(draft.trip_duration(), 32);

        let report = validate_submission(&draft, date("2024-12-01"), MAX_TRIP_DAYS);
        assert_eq!(report.errors, vec![duration_limit_message(Some(Persona::Family), 21)]);
        assert!(report.errors[0].starts_with("Family trips"));
    }

    #[test]
    fn test_ceiling_messages_are_distinct_per_persona() {
        let personas = [
            Some(Persona::NewTraveler),
            Some(Persona::ExperiencedTraveler),
            Some(Persona::SoloFemaleTraveler),
            Some(Persona::Minor),
            Some(Persona::Family),
            None,
        ];
        let messages: std::collections::HashSet<String> =
            personas.iter().map(|p| duration_limit_message(*p, 21)).collect();
        assert_eq!(messages.len(), personas.len());

        let mut draft = complete_draft();
        draft.persona = None;
        draft.end_date = Some(date("2025-06-30"));
        draft.destinations = vec![Destination::new("Paris", 30)];
        let report = validate_submission(&draft, today(), MAX_TRIP_DAYS);
        assert!(report.errors.contains(&duration_limit_message(None, 21)));
    }

    #[test]
    fn test_collects_all_errors_in_order() {
        let report = validate_submission(&TripDraft::empty(), today(), MAX_TRIP_DAYS);
        assert_eq!(
            report.errors,
            vec![
                "Please select who you are traveling as.",
                "Please select your passport country.",
                "Please select a start date.",
                "Please select an end date.",
                "Please add at least one destination.",
            ]
        );
    }

    #[test]
    fn test_past_and_reversed_dates() {
        let mut draft = complete_draft();
        draft.start_date = Some(date("2025-04-01"));
        draft.end_date = Some(date("2025-03-25"));

        let report = validate_submission(&draft, today(), MAX_TRIP_DAYS);
        assert!(report.errors.contains(&"Start date cannot be in the past.".to_string()));
        assert!(report.errors.contains(&"End date must be on or after the start date.".to_string()));
    }

    #[test]
    fn test_local_messages_differ_from_submission() {
        let local = validate_local(&TripDraft::empty());
        let submission = validate_submission(&TripDraft::empty(), today(), MAX_TRIP_DAYS);
        assert_eq!(local.errors[0], "Traveler type is required");
        assert_ne!(local.errors[0], submission.errors[0]);
    }
}
