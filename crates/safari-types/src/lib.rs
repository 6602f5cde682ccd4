//! Shared wire types for the safari planner.
//!
//! This crate is the single source of truth for everything that crosses the
//! HTTP boundary: the submitted payload, the generated itinerary document,
//! the lifecycle status enum, and the read-side projections.
//!
//! ## Rules
//!
//! 1. All boundary types live here - no inline struct definitions in handlers
//! 2. Wire names are camelCase; status values are SCREAMING_SNAKE_CASE
//! 3. Inbound payload fields are lenient (`#[serde(default)]`) so intake
//!    validation can enumerate every violation instead of failing at parse

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// REQUEST PAYLOAD
// ============================================================================

/// Requested travel window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_flexible: bool,
}

impl TravelDates {
    /// Nights between arrival and departure.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Adults/children split for one residency bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCount {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

impl PartyCount {
    pub fn total(&self) -> u32 {
        self.adults + self.children
    }
}

/// Travel party split by residency (park fees differ per bucket).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelGroup {
    #[serde(default)]
    pub international: PartyCount,
    #[serde(default)]
    pub resident: PartyCount,
}

impl TravelGroup {
    pub fn travelers(&self) -> u32 {
        self.international.total() + self.resident.total()
    }
}

/// A submitted safari planning request.
///
/// `travel_dates` is the only structurally required section; everything else
/// defaults so the intake validator sees the full picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafariRequest {
    pub travel_dates: TravelDates,
    #[serde(default)]
    pub group: TravelGroup,
    #[serde(default)]
    pub accommodation: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub travel_style: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub special_requests: String,
}

impl SafariRequest {
    /// Total head count across both residency buckets.
    pub fn travelers(&self) -> u32 {
        self.group.travelers()
    }
}

// ============================================================================
// LIFECYCLE STATUS
// ============================================================================

/// Request lifecycle status.
///
/// ```text
/// RECEIVED ──► PROCESSING ──► COMPLETED ──► CANCELLED (administrative)
///                   │   └───► FAILED
///                   └───────► CANCELLED (administrative)
/// ```
///
/// `COMPLETED`, `FAILED` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Received,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the canonical state machine contains the edge `self -> next`.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (*self, next),
            (Received, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Completed, Cancelled)
        )
    }

    /// Edges reachable through the administrative status updater.
    /// The generation edges belong to the processor and cannot be requested.
    pub fn admin_can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!((*self, next), (Processing, Cancelled) | (Completed, Cancelled))
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(Self::Received),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown request status: {0}")]
pub struct ParseStatusError(pub String);

// ============================================================================
// ITINERARY DOCUMENT
// ============================================================================

/// One scheduled activity within a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// Overnight stay for a day. `type` on the wire (lodge, camp, hotel).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: String,
}

/// A single day of the generated plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub accommodation: Option<Accommodation>,
    #[serde(default)]
    pub meals: Vec<String>,
    #[serde(default)]
    pub total_cost: f64,
}

/// Generated travel plan document.
///
/// Parsed leniently: completion providers routinely omit optional sections,
/// so only the day list is load-bearing. An empty day list is rejected at
/// generation time, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default)]
    pub summary: String,
    /// Day-by-day plan. Wire name stays `itinerary` for client compatibility.
    #[serde(rename = "itinerary", default)]
    pub days: Vec<ItineraryDay>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub cost_per_person: f64,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

// ============================================================================
// READ-SIDE PROJECTIONS
// ============================================================================

/// Status lookup projection returned by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Itinerary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// One row of a search result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A page of search results plus the continuation token for the next page.
/// No token means the sequence is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<RequestSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

// ============================================================================
// HTTP BODIES
// ============================================================================

/// `202 Accepted` acknowledgement returned on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub message: String,
}

/// Body of the administrative status update endpoint.
///
/// `status` stays a plain string so an unknown value surfaces as a field
/// violation instead of a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_token: Option<String>,
}

/// Body of the challenge issuance endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub email: String,
}

/// Body of the challenge validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeAnswer {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // ── Status machine ───────────────────────────────────────────

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            RequestStatus::Received,
            RequestStatus::Processing,
            RequestStatus::Completed,
            RequestStatus::Failed,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(RequestStatus::from_str(s.as_str()).unwrap(), s);
        }
        assert!(RequestStatus::from_str("PENDING_BOOKING").is_err());
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use RequestStatus::*;
        for terminal in [Completed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Received, Processing, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        // Completed -> Cancelled is the one admissible exit from a terminal-
        // looking state and it is administrative.
        assert!(Completed.can_transition_to(Cancelled));
        assert!(Completed.admin_can_transition_to(Cancelled));
    }

    #[test]
    fn generation_edges_are_not_administrative() {
        use RequestStatus::*;
        assert!(Received.can_transition_to(Processing));
        assert!(!Received.admin_can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(!Processing.admin_can_transition_to(Completed));
        assert!(Processing.admin_can_transition_to(Cancelled));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&RequestStatus::Received).unwrap();
        assert_eq!(json, r#""RECEIVED""#);
        let back: RequestStatus = serde_json::from_str(r#""CANCELLED""#).unwrap();
        assert_eq!(back, RequestStatus::Cancelled);
    }

    // ── Payload ──────────────────────────────────────────────────

    #[test]
    fn payload_parses_full_wire_shape() {
        let raw = r#"{
            "travelDates": {"startDate": "2025-12-20", "endDate": "2025-12-27", "isFlexible": false},
            "group": {"international": {"adults": 2, "children": 1}, "resident": {"adults": 0, "children": 0}},
            "accommodation": "luxury_lodge",
            "interests": ["wildlife", "photography"],
            "travelStyle": "family",
            "email": "jane@example.com",
            "specialRequests": "vegetarian meals"
        }"#;
        let req: SafariRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.travelers(), 3);
        assert_eq!(req.travel_dates.nights(), 7);
        assert_eq!(req.interests.len(), 2);
        assert_eq!(req.email, "jane@example.com");
    }

    #[test]
    fn payload_tolerates_missing_optional_sections() {
        let raw = r#"{"travelDates": {"startDate": "2026-01-10", "endDate": "2026-01-12"}}"#;
        let req: SafariRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.travelers(), 0);
        assert!(req.email.is_empty());
        assert!(req.interests.is_empty());
        assert!(!req.travel_dates.is_flexible);
    }

    // ── Itinerary document ───────────────────────────────────────

    #[test]
    fn itinerary_parses_lenient_provider_output() {
        let raw = r#"{
            "summary": "A week in the Mara",
            "itinerary": [
                {"day": 1, "date": "2025-12-20",
                 "activities": [{"time": "09:00", "description": "Game drive", "location": "Maasai Mara"}],
                 "accommodation": {"name": "Mara Lodge", "type": "lodge", "location": "Maasai Mara"},
                 "meals": ["breakfast", "dinner"]}
            ],
            "totalCost": 4200.0,
            "costPerPerson": 1400.0
        }"#;
        let doc: Itinerary = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.days.len(), 1);
        assert_eq!(doc.days[0].activities[0].location, "Maasai Mara");
        assert_eq!(doc.days[0].accommodation.as_ref().unwrap().kind, "lodge");
        assert!(doc.inclusions.is_empty());
    }

    #[test]
    fn itinerary_day_list_keeps_wire_name() {
        let doc = Itinerary {
            summary: "x".into(),
            days: vec![ItineraryDay::default()],
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("itinerary").is_some());
        assert!(json.get("days").is_none());
    }

    // ── HTTP bodies ──────────────────────────────────────────────

    #[test]
    fn submit_receipt_uses_camel_case_keys() {
        let receipt = SubmitReceipt {
            request_id: Uuid::nil(),
            status: RequestStatus::Received,
            message: "queued".into(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("requestId").is_some());
        assert_eq!(json["status"], "RECEIVED");
    }

    #[test]
    fn status_change_tolerates_a_bare_status() {
        let change: StatusChange = serde_json::from_str(r#"{"status":"CANCELLED"}"#).unwrap();
        assert_eq!(change.status, "CANCELLED");
        assert!(change.proof_token.is_none());

        let change: StatusChange =
            serde_json::from_str(r#"{"status":"CANCELLED","proofToken":"tok"}"#).unwrap();
        assert_eq!(change.proof_token.as_deref(), Some("tok"));
    }
}
