use chrono::{DateTime, NaiveDate, Utc};

use tripbrief_shared::{BriefContent, StructuredBrief, TripData};

use crate::formatter::{escape_html, format_freeform};

#[derive(Debug, Clone)]
pub struct Branding {
    pub brand_name: String,
    pub support_email: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            brand_name: "TripBrief".to_string(),
            support_email: "support@tripbrief.app".to_string(),
        }
    }
}

/// Structured sections in display order: key, title, icon.
pub const SECTIONS: [(&str, &str, &str); 17] = [
    ("cover", "Your Trip", "🧭"),
    ("intro", "Introduction", "👋"),
    ("day_by_day", "Day-by-Day Itinerary", "🗓️"),
    ("activities", "Activities", "🎯"),
    ("food", "Food & Dining", "🍽️"),
    ("packing", "Packing List", "🧳"),
    ("safety", "Safety", "🛡️"),
    ("visa", "Visa & Entry", "🛂"),
    ("budget", "Budget", "💰"),
    ("language", "Language", "🗣️"),
    ("persona_tips", "Tips for You", "💡"),
    ("weather", "Weather", "🌤️"),
    ("transport", "Getting Around", "🚆"),
    ("booking", "Booking Tips", "📅"),
    ("accessibility", "Accessibility", "♿"),
    ("money", "Money Matters", "💱"),
    ("final_notes", "Final Notes", "📝"),
];

const STYLE: &str = r#"
body { margin: 0; background: #f4f6fb; color: #1f2937; font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; }
.brief { max-width: 860px; margin: 0 auto; background: #ffffff; }
.brief-header { background: linear-gradient(135deg, #1e3a8a, #0ea5e9); color: #ffffff; padding: 40px 48px; }
.brief-header .brand { font-size: 14px; letter-spacing: 2px; text-transform: uppercase; opacity: 0.85; }
.brief-header h1 { margin: 8px 0 4px; font-size: 32px; }
.brief-header .generated { margin: 0; font-size: 13px; opacity: 0.8; }
.trip-summary { display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px 32px; padding: 24px 48px; background: #eef2ff; border-bottom: 1px solid #c7d2fe; }
.trip-summary dt { font-size: 12px; text-transform: uppercase; color: #4b5563; }
.trip-summary dd { margin: 0 0 4px; font-weight: 600; }
.brief-content { padding: 32px 48px; }
.brief-section { margin-bottom: 32px; }
.section-title { font-size: 22px; border-bottom: 2px solid #e5e7eb; padding-bottom: 6px; }
.section-title .icon, .section-heading .icon { margin-right: 8px; }
.day-block { background: #f9fafb; border-left: 4px solid #0ea5e9; padding: 12px 16px; margin: 12px 0; border-radius: 4px; }
.brief-footer { padding: 24px 48px; font-size: 13px; color: #6b7280; border-top: 1px solid #e5e7eb; text-align: center; }
.brief-footer a { color: #1e3a8a; }
"#;

/// Headline for the brief: the model's theme title, or the destinations.
pub fn brief_title(trip: &TripData, content: &BriefContent) -> String {
    if let BriefContent::Structured(StructuredBrief {
        theme_title: Some(title),
        ..
    }) = content
    {
        return title.clone();
    }
    let cities: Vec<&str> = trip.destinations.iter().map(|d| d.city_name.as_str()).collect();
    if cities.is_empty() {
        "Your Travel Brief".to_string()
    } else {
        format!("Your Travel Brief: {}", cities.join(", "))
    }
}

/// One self-contained HTML document: header, trip summary, the brief and a
/// footer. Styles are inline.
pub fn render_document(
    branding: &Branding,
    trip: &TripData,
    content: &BriefContent,
    generated_at: DateTime<Utc>,
) -> String {
    let title = escape_html(&brief_title(trip, content));
    let body = match content {
        BriefContent::Structured(brief) => render_structured(brief),
        BriefContent::Freeform(text) => format!(
            "<section class=\"brief-section freeform\">\n{}\n</section>",
            format_freeform(text)
        ),
    };
    let brand = escape_html(&branding.brand_name);
    let support = escape_html(&branding.support_email);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="brief">
<header class="brief-header">
<div class="brand">{brand}</div>
<h1>{title}</h1>
<p class="generated">Generated {generated}</p>
</header>
{summary}
<main class="brief-content">
{body}
</main>
<footer class="brief-footer">
<p>Questions about your brief? Contact <a href="mailto:{support}">{support}</a>.</p>
<p>&copy; {year} {brand}. Always confirm entry requirements with official sources before you travel.</p>
</footer>
</div>
</body>
</html>
"#,
        generated = generated_at.format("%B %-d, %Y"),
        summary = render_summary(trip),
        year = generated_at.format("%Y"),
    )
}

fn render_summary(trip: &TripData) -> String {
    let dates = match (trip.start_date, trip.end_date) {
        (Some(start), Some(end)) => format!("{} – {} ({} days)", long_date(start), long_date(end), trip.trip_duration),
        (Some(start), None) => long_date(start),
        _ => "Flexible".to_string(),
    };
    let destinations = trip
        .destinations
        .iter()
        .map(|d| {
            let unit = if d.days_allocated == 1 { "day" } else { "days" };
            format!("{} ({} {})", d.city_name, d.days_allocated, unit)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut rows = vec![
        ("Traveler", trip.persona.clone()),
        ("Passport", trip.passport_country.clone()),
        ("Dates", dates),
        ("Destinations", destinations),
        ("Group size", trip.group_size.to_string()),
        ("Budget", trip.budget.clone().unwrap_or_else(|| "Not specified".to_string())),
    ];
    if let Some(ages) = &trip.ages {
        rows.push(("Ages", ages.clone()));
    }

    let items: String = rows
        .iter()
        .map(|(label, value)| format!("<div><dt>{}</dt><dd>{}</dd></div>", label, escape_html(value)))
        .collect();
    format!("<dl class=\"trip-summary\">{}</dl>", items)
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn render_structured(brief: &StructuredBrief) -> String {
    let mut out = Vec::new();
    for (key, title, icon) in SECTIONS {
        let inner = match key {
            "day_by_day" => brief.day_by_day_html.as_ref().map(|days| {
                days.iter()
                    .map(|day| format!("<div class=\"day-block\">{}</div>", day))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
            _ => section_html(brief, key).map(str::to_string),
        };
        if let Some(inner) = inner {
            out.push(format!(
                "<section class=\"brief-section\" data-section=\"{key}\">\n<h2 class=\"section-title\"><span class=\"icon\">{icon}</span>{}</h2>\n<div class=\"section-body\">{inner}</div>\n</section>",
                escape_html(title)
            ));
        }
    }
    out.join("\n")
}

fn section_html<'a>(brief: &'a StructuredBrief, key: &str) -> Option<&'a str> {
    let html = match key {
        "cover" => Some(&brief.cover_html),
        "intro" => Some(&brief.intro_html),
        "activities" => brief.activities_html.as_ref(),
        "food" => brief.food_html.as_ref(),
        "packing" => brief.packing_html.as_ref(),
        "safety" => brief.safety_html.as_ref(),
        "visa" => brief.visa_html.as_ref(),
        "budget" => brief.budget_html.as_ref(),
        "language" => brief.language_html.as_ref(),
        "persona_tips" => brief.persona_tips_html.as_ref(),
        "weather" => brief.weather_html.as_ref(),
        "transport" => brief.transport_html.as_ref(),
        "booking" => brief.booking_tips_html.as_ref(),
        "accessibility" => brief.accessibility_html.as_ref(),
        "money" => brief.money_html.as_ref(),
        "final_notes" => brief.final_notes_html.as_ref(),
        _ => None,
    };
    html.map(String::as_str).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tripbrief_shared::Destination;

    fn trip() -> TripData {
        TripData {
            persona: "Family".into(),
            passport_country: "NZ".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 7),
            trip_duration: 7,
            destinations: vec![Destination::new("Paris", 4), Destination::new("Lyon", 3)],
            activity_preferences: vec![],
            group_size: 4,
            ages: Some("8, 11".into()),
            budget: None,
            upload_keys: vec![],
            defaults_applied: vec![],
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_structured_sections_in_canonical_order() {
        let brief = StructuredBrief {
            theme_title: Some("A Taste of France".into()),
            cover_html: "<p>cover</p>".into(),
            intro_html: "<p>intro</p>".into(),
            day_by_day_html: Some(vec!["<p>day one</p>".into(), "<p>day two</p>".into()]),
            money_html: Some("<p>euros</p>".into()),
            food_html: Some("<p>croissants</p>".into()),
            ..Default::default()
        };
        let html = render_document(&Branding::default(), &trip(), &BriefContent::Structured(brief), at());

        let order: Vec<usize> = ["data-section=\"cover\"", "data-section=\"intro\"", "data-section=\"day_by_day\"", "data-section=\"food\"", "data-section=\"money\""]
            .iter()
            .map(|marker| html.find(marker).expect(marker))
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        assert!(!html.contains("data-section=\"visa\""));
        assert!(!html.contains("data-section=\"packing\""));
        assert_eq!(html.matches("class=\"day-block\"").count(), 2);
        assert!(html.contains("<h1>A Taste of France</h1>"));
    }

    #[test]
    fn test_summary_and_branding() {
        let html = render_document(
            &Branding::default(),
            &trip(),
            &BriefContent::Freeform("Bonjour".into()),
            at(),
        );
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(html.contains("June 1, 2025 – June 7, 2025 (7 days)"));
        assert!(html.contains("Paris (4 days), Lyon (3 days)"));
        assert!(html.contains("<dd>Not specified</dd>"));
        assert!(html.contains("<dd>8, 11</dd>"));
        assert!(html.contains("<p>Bonjour</p>"));
        assert!(html.contains("mailto:support@tripbrief.app"));
        assert!(html.contains("Your Travel Brief: Paris, Lyon"));
        assert!(html.contains("Generated May 20, 2025"));
    }

    #[test]
    fn test_summary_escapes_user_values() {
        let mut data = trip();
        data.destinations = vec![Destination::new("<b>Nice</b>", 2)];
        let html = render_document(&Branding::default(), &data, &BriefContent::Freeform(String::new()), at());
        assert!(html.contains("&lt;b&gt;Nice&lt;/b&gt;"));
    }
}
