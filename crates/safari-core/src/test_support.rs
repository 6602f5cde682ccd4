//! Shared fixtures and mock collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use safari_types::{
    Activity, Itinerary, ItineraryDay, PartyCount, SafariRequest, TravelDates, TravelGroup,
};

use crate::error::{PlannerError, Result};
use crate::ports::{EmailMessage, ItineraryGenerator, Mailer};

pub fn sample_payload() -> SafariRequest {
    payload_for("jane@example.com")
}

pub fn payload_for(email: &str) -> SafariRequest {
    SafariRequest {
        travel_dates: TravelDates {
            start_date: "2025-12-20".parse().unwrap(),
            end_date: "2025-12-27".parse().unwrap(),
            is_flexible: false,
        },
        group: TravelGroup {
            international: PartyCount {
                adults: 2,
                children: 1,
            },
            resident: PartyCount::default(),
        },
        accommodation: "luxury_lodge".into(),
        interests: vec!["wildlife".into(), "photography".into()],
        travel_style: "family".into(),
        email: email.into(),
        special_requests: "vegetarian meals".into(),
    }
}

pub fn sample_itinerary() -> Itinerary {
    Itinerary {
        summary: "A week in the Maasai Mara".into(),
        days: vec![ItineraryDay {
            day: 1,
            date: "2025-12-20".into(),
            activities: vec![Activity {
                time: "09:00".into(),
                description: "Morning game drive".into(),
                location: "Maasai Mara".into(),
            }],
            accommodation: None,
            meals: vec!["breakfast".into(), "dinner".into()],
            total_cost: 600.0,
        }],
        total_cost: 4200.0,
        cost_per_person: 1400.0,
        inclusions: vec!["park fees".into()],
        exclusions: vec!["flights".into()],
        notes: vec![],
    }
}

/// Generator returning a fixed document and counting invocations.
#[derive(Default)]
pub struct StubGenerator {
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItineraryGenerator for StubGenerator {
    async fn generate(&self, _request: &SafariRequest) -> Result<Itinerary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample_itinerary())
    }
}

/// Generator that always fails.
pub struct FailingGenerator;

#[async_trait]
impl ItineraryGenerator for FailingGenerator {
    async fn generate(&self, _request: &SafariRequest) -> Result<Itinerary> {
        Err(PlannerError::UpstreamFailure("provider returned 500".into()))
    }
}

/// Generator that sleeps past any reasonable test timeout.
pub struct SlowGenerator(pub Duration);

#[async_trait]
impl ItineraryGenerator for SlowGenerator {
    async fn generate(&self, _request: &SafariRequest) -> Result<Itinerary> {
        tokio::time::sleep(self.0).await;
        Ok(sample_itinerary())
    }
}

/// Mailer that records every message.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Mailer that always fails, for best-effort paths.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        Err(PlannerError::Notification("mail relay unreachable".into()))
    }
}
