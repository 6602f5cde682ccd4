//! [`ItineraryGenerator`] implementations: the live model-backed agent and a
//! deterministic keyless fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use safari_core::{ItineraryGenerator, PlannerError, Result};
use safari_types::{Accommodation, Activity, Itinerary, ItineraryDay, SafariRequest};

use crate::anthropic::AnthropicClient;
use crate::extract::extract_itinerary;
use crate::llm::LlmClient;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Model-backed itinerary generation.
pub struct ItineraryAgent {
    client: Arc<dyn LlmClient>,
}

impl ItineraryAgent {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Build over an Anthropic client configured from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(AnthropicClient::from_env()?)))
    }
}

#[async_trait]
impl ItineraryGenerator for ItineraryAgent {
    async fn generate(&self, request: &SafariRequest) -> Result<Itinerary> {
        let user_prompt = build_prompt(request);
        debug!(chars = user_prompt.len(), "prompt built");

        let raw = self
            .client
            .chat_json(SYSTEM_PROMPT, &user_prompt)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(e.to_string()))?;

        let doc = extract_itinerary(&raw, request.travelers())
            .map_err(|e| PlannerError::UpstreamFailure(e.to_string()))?;
        info!(
            model = self.client.model_name(),
            days = doc.days.len(),
            total_cost = doc.total_cost,
            "itinerary generated"
        );
        Ok(doc)
    }
}

/// Rotation of parks used by the keyless fallback plan.
const CIRCUIT: &[(&str, &str)] = &[
    ("Maasai Mara", "Mara River Lodge"),
    ("Lake Nakuru", "Flamingo Hill Camp"),
    ("Amboseli", "Kilimanjaro View Lodge"),
    ("Tsavo East", "Galdessa Camp"),
];

const DAY_RATE_PER_TRAVELER: f64 = 275.0;

/// Deterministic generator for keyless local runs. Produces a plausible
/// Kenya circuit sized to the requested window.
pub struct CannedGenerator;

#[async_trait]
impl ItineraryGenerator for CannedGenerator {
    async fn generate(&self, request: &SafariRequest) -> Result<Itinerary> {
        let dates = &request.travel_dates;
        let travelers = u32::max(request.travelers(), 1);
        let day_cost = DAY_RATE_PER_TRAVELER * f64::from(travelers);

        let days: Vec<ItineraryDay> = dates
            .start_date
            .iter_days()
            .take_while(|d| *d <= dates.end_date)
            .enumerate()
            .map(|(i, date)| {
                let (park, lodge) = CIRCUIT[(i / 2) % CIRCUIT.len()];
                ItineraryDay {
                    day: i as u32 + 1,
                    date: date.to_string(),
                    activities: vec![Activity {
                        time: if i == 0 { "14:00".into() } else { "06:30".into() },
                        description: if i == 0 {
                            "Arrival transfer and afternoon game drive".into()
                        } else {
                            "Sunrise game drive".into()
                        },
                        location: park.into(),
                    }],
                    accommodation: Some(Accommodation {
                        name: lodge.into(),
                        kind: "lodge".into(),
                        location: park.into(),
                    }),
                    meals: vec!["breakfast".into(), "lunch".into(), "dinner".into()],
                    total_cost: day_cost,
                }
            })
            .collect();

        let total_cost = day_cost * days.len() as f64;
        Ok(Itinerary {
            summary: format!(
                "A {}-day Kenya safari for {} travelers",
                days.len(),
                travelers
            ),
            total_cost,
            cost_per_person: total_cost / f64::from(travelers),
            inclusions: vec!["park fees".into(), "full-board accommodation".into()],
            exclusions: vec!["international flights".into(), "travel insurance".into()],
            notes: vec!["Generated offline; contact us to refine this plan.".into()],
            days,
        })
    }
}
