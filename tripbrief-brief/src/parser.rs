use serde_json::{Map, Value};

use tripbrief_shared::{BriefContent, StructuredBrief};

/// Classify a raw completion response.
///
/// A JSON object carrying both `cover_html` and `intro_html` is a
/// structured brief; anything else is freeform text. Never fails.
pub fn parse_brief(raw: &str) -> BriefContent {
    match structured(strip_code_fence(raw)) {
        Some(brief) => BriefContent::Structured(brief),
        None => BriefContent::Freeform(raw.to_string()),
    }
}

/// Models often wrap JSON in a ```json fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn structured(text: &str) -> Option<StructuredBrief> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;

    let cover_html = html(obj, "cover_html")?;
    let intro_html = html(obj, "intro_html")?;

    Some(StructuredBrief {
        theme_title: html(obj, "theme_title"),
        cover_html,
        intro_html,
        day_by_day_html: days(obj.get("day_by_day_html")),
        activities_html: html(obj, "activities_html"),
        food_html: html(obj, "food_html"),
        packing_html: html(obj, "packing_html"),
        safety_html: html(obj, "safety_html"),
        visa_html: html(obj, "visa_html"),
        budget_html: html(obj, "budget_html"),
        language_html: html(obj, "language_html"),
        persona_tips_html: html(obj, "persona_tips_html"),
        weather_html: html(obj, "weather_html"),
        transport_html: html(obj, "transport_html"),
        booking_tips_html: html(obj, "booking_tips_html").or_else(|| html(obj, "booking_html")),
        accessibility_html: html(obj, "accessibility_html"),
        money_html: html(obj, "money_html"),
        final_notes_html: html(obj, "final_notes_html"),
    })
}

fn html(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn days(value: Option<&Value>) -> Option<Vec<String>> {
    let days: Vec<String> = match value? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(day) => html(day, "html").or_else(|| html(day, "content")),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => return None,
    };
    if days.is_empty() {
        None
    } else {
        Some(days)
    }
}
