//! Pulling a usable itinerary document out of raw model output.
//!
//! Models asked for bare JSON still wrap it in markdown fences or prose
//! often enough that both forms are handled: a ```json fence wins, otherwise
//! the outermost brace pair is taken.

use anyhow::{anyhow, bail, Context, Result};

use safari_types::Itinerary;

/// Locate the JSON payload within raw completion text.
fn json_slice(raw: &str) -> Option<&str> {
    if let Some(fence) = raw.find("```json") {
        let start = fence + "```json".len();
        let end = raw[start..].find("```")?;
        return Some(raw[start..start + end].trim());
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(raw[start..=end].trim())
}

/// Parse and normalize one completion into an [`Itinerary`].
///
/// The document is accepted leniently (missing optional sections default),
/// but an empty day list is a generation failure. Zeroed cost fields are
/// recomputed: the total from per-day costs, the per-person figure from the
/// traveler count.
pub fn extract_itinerary(raw: &str, travelers: u32) -> Result<Itinerary> {
    let json_str = json_slice(raw).ok_or_else(|| anyhow!("no JSON object in model output"))?;
    let mut doc: Itinerary =
        serde_json::from_str(json_str).context("model output is not a valid itinerary document")?;

    if doc.days.is_empty() {
        bail!("itinerary document has no days");
    }

    if doc.total_cost == 0.0 {
        doc.total_cost = doc.days.iter().map(|d| d.total_cost).sum();
    }
    if doc.cost_per_person == 0.0 && travelers > 0 {
        // Rounded to cents so the figure reads like a price.
        doc.cost_per_person = (doc.total_cost / f64::from(travelers) * 100.0).round() / 100.0;
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "summary": "Three days in the Mara",
        "itinerary": [
            {"day": 1, "date": "2026-02-10", "activities": [], "meals": ["dinner"], "totalCost": 850},
            {"day": 2, "date": "2026-02-11", "activities": [], "meals": [], "totalCost": 400}
        ]
    }"#;

    #[test]
    fn fenced_output_is_extracted() {
        let raw = format!("Here is your itinerary:\n```json\n{DOC}\n```\nEnjoy!");
        let doc = extract_itinerary(&raw, 2).unwrap();
        assert_eq!(doc.days.len(), 2);
        assert_eq!(doc.summary, "Three days in the Mara");
    }

    #[test]
    fn bare_braces_with_surrounding_prose_are_extracted() {
        let raw = format!("Sure thing! {DOC} Let me know if you want changes.");
        let doc = extract_itinerary(&raw, 2).unwrap();
        assert_eq!(doc.days.len(), 2);
    }

    #[test]
    fn zeroed_costs_are_recomputed_from_days_and_party() {
        let doc = extract_itinerary(DOC, 2).unwrap();
        assert_eq!(doc.total_cost, 1250.0);
        assert_eq!(doc.cost_per_person, 625.0);
    }

    #[test]
    fn recomputed_per_person_cost_is_rounded_to_cents() {
        let doc = extract_itinerary(DOC, 3).unwrap();
        assert_eq!(doc.total_cost, 1250.0);
        // 1250 / 3 = 416.666..., carried as money.
        assert_eq!(doc.cost_per_person, 416.67);
    }

    #[test]
    fn provided_costs_are_left_alone() {
        let raw = r#"{
            "itinerary": [{"day": 1, "totalCost": 100}],
            "totalCost": 5000,
            "costPerPerson": 2500
        }"#;
        let doc = extract_itinerary(raw, 2).unwrap();
        assert_eq!(doc.total_cost, 5000.0);
        assert_eq!(doc.cost_per_person, 2500.0);
    }

    #[test]
    fn empty_day_list_is_rejected() {
        let raw = r#"{"summary": "nothing", "itinerary": []}"#;
        let err = extract_itinerary(raw, 2).unwrap_err();
        assert!(err.to_string().contains("no days"));
    }

    #[test]
    fn output_without_json_is_rejected() {
        assert!(extract_itinerary("I could not generate an itinerary.", 2).is_err());
        assert!(extract_itinerary("", 2).is_err());
    }

    #[test]
    fn zero_travelers_does_not_divide() {
        let doc = extract_itinerary(DOC, 0).unwrap();
        assert_eq!(doc.total_cost, 1250.0);
        assert_eq!(doc.cost_per_person, 0.0);
    }
}
