//! Prompt construction for itinerary generation.

use safari_types::SafariRequest;

pub const SYSTEM_PROMPT: &str = "You are an expert safari travel planner. \
You design day-by-day itineraries for trips within Kenya and you respond \
with a single JSON document matching the structure the user specifies.";

/// Target document shape, spelled out verbatim for the model.
const RESPONSE_SHAPE: &str = r#"{
    "summary": "Brief overview of the safari",
    "itinerary": [
        {
            "day": 1,
            "date": "YYYY-MM-DD",
            "activities": [
                {
                    "time": "HH:MM",
                    "description": "Activity description",
                    "location": "Location name"
                }
            ],
            "accommodation": {
                "name": "Lodge/Camp name",
                "type": "Lodge/Camp type",
                "location": "Location"
            },
            "meals": ["Breakfast", "Lunch", "Dinner"],
            "totalCost": 0
        }
    ],
    "totalCost": 0,
    "costPerPerson": 0,
    "inclusions": ["List of what's included"],
    "exclusions": ["List of what's not included"],
    "notes": ["Important notes and recommendations"]
}"#;

/// Build the user prompt from a validated request.
pub fn build_prompt(request: &SafariRequest) -> String {
    let dates = &request.travel_dates;

    let mut preferences = Vec::new();
    if !request.accommodation.is_empty() {
        preferences.push(format!("accommodation type: {}", request.accommodation));
    }
    if !request.interests.is_empty() {
        preferences.push(format!("interests: {}", request.interests.join(", ")));
    }
    if !request.travel_style.is_empty() {
        preferences.push(format!("travel style: {}", request.travel_style));
    }
    // Clients send the literal string "None" for an untouched field.
    if !request.special_requests.is_empty() && request.special_requests != "None" {
        preferences.push(format!("special requests: {}", request.special_requests));
    }
    let preferences = if preferences.is_empty() {
        "no specific preferences".to_string()
    } else {
        preferences.join(", ")
    };

    format!(
        "Create a detailed safari itinerary for {travelers} travelers from {start} to {end}.\n\
         The travelers have the following preferences: {preferences}. \
         Only include destinations in Kenya.\n\n\
         Please provide a detailed day-by-day itinerary including:\n\
         1. Accommodation recommendations\n\
         2. Activities and game drives\n\
         3. Meal arrangements\n\
         4. Transportation details\n\
         5. Estimated costs\n\n\
         Format the response as a JSON object with the following structure:\n{shape}",
        travelers = request.travelers(),
        start = dates.start_date,
        end = dates.end_date,
        preferences = preferences,
        shape = RESPONSE_SHAPE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use safari_types::{PartyCount, TravelDates, TravelGroup};

    fn request() -> SafariRequest {
        SafariRequest {
            travel_dates: TravelDates {
                start_date: "2026-02-10".parse().unwrap(),
                end_date: "2026-02-15".parse().unwrap(),
                is_flexible: false,
            },
            group: TravelGroup {
                international: PartyCount {
                    adults: 2,
                    children: 1,
                },
                resident: PartyCount {
                    adults: 1,
                    children: 0,
                },
            },
            accommodation: "luxury_lodge".into(),
            interests: vec!["wildlife".into(), "photography".into()],
            travel_style: "family".into(),
            email: "jane@example.com".into(),
            special_requests: "None".into(),
        }
    }

    #[test]
    fn prompt_carries_party_dates_and_preferences() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("4 travelers"));
        assert!(prompt.contains("from 2026-02-10 to 2026-02-15"));
        assert!(prompt.contains("accommodation type: luxury_lodge"));
        assert!(prompt.contains("interests: wildlife, photography"));
        assert!(prompt.contains("Only include destinations in Kenya"));
        assert!(prompt.contains(r#""costPerPerson""#));
    }

    #[test]
    fn placeholder_special_requests_are_dropped() {
        let prompt = build_prompt(&request());
        assert!(!prompt.contains("special requests"));

        let mut with_requests = request();
        with_requests.special_requests = "vegetarian meals".into();
        let prompt = build_prompt(&with_requests);
        assert!(prompt.contains("special requests: vegetarian meals"));
    }

    #[test]
    fn empty_preferences_collapse_to_a_default_phrase() {
        let mut bare = request();
        bare.accommodation.clear();
        bare.interests.clear();
        bare.travel_style.clear();
        bare.special_requests.clear();
        let prompt = build_prompt(&bare);
        assert!(prompt.contains("no specific preferences"));
    }
}
