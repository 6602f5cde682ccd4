//! Administrative status updates, gated on a redeemed verification proof.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use safari_types::{RequestStatus, StatusView};

use crate::error::{PlannerError, Result};
use crate::notify::status_change_email;
use crate::ports::{Mailer, RequestStore};
use crate::record::NextState;
use crate::verify::VerificationService;

pub struct StatusUpdater {
    store: Arc<dyn RequestStore>,
    verification: Arc<VerificationService>,
    mailer: Arc<dyn Mailer>,
}

impl StatusUpdater {
    pub fn new(
        store: Arc<dyn RequestStore>,
        verification: Arc<VerificationService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            verification,
            mailer,
        }
    }

    /// Apply an administrative transition to `request_id`.
    ///
    /// The caller must present a live proof token minted for the record's own
    /// email; redeeming it happens before the transition is examined, and a
    /// proof spent on an invalid transition is not refunded. The only
    /// administrative edges are PROCESSING -> CANCELLED and
    /// COMPLETED -> CANCELLED.
    pub async fn update_status(
        &self,
        request_id: Uuid,
        new_status: RequestStatus,
        proof_token: Option<&str>,
    ) -> Result<StatusView> {
        let Some(record) = self.store.load(request_id).await? else {
            return Err(PlannerError::NotFound(format!("request {request_id}")));
        };

        // The proof is bound to the record's email, so only someone who
        // completed the challenge for that inbox gets past this line.
        self.verification
            .redeem_proof(&record.email, proof_token)
            .await?;

        let from = record.status;
        if !from.admin_can_transition_to(new_status) {
            return Err(PlannerError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        // Post-check, the target can only be CANCELLED. The conditional write
        // loses if the record moved since we loaded it.
        let updated = self
            .store
            .transition(request_id, from, NextState::cancelled())
            .await?;
        let Some(updated) = updated else {
            let current = self
                .store
                .load(request_id)
                .await?
                .ok_or_else(|| PlannerError::NotFound(format!("request {request_id}")))?;
            return Err(PlannerError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        };

        info!(
            request_id = %request_id,
            from = %from,
            to = %updated.status,
            "request status updated by administrator"
        );

        if let Err(e) = self.mailer.send(&status_change_email(&updated, from)).await {
            warn!(request_id = %request_id, error = %e, "status change email failed to send");
        }

        Ok(updated.status_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Proof;
    use crate::memory::{MemoryChallengeStore, MemoryRequestStore};
    use crate::ports::ChallengeStore;
    use crate::record::RequestRecord;
    use crate::test_support::{sample_itinerary, sample_payload, FailingMailer, RecordingMailer};
    use crate::verify::VerificationService;

    // sample_payload()'s submitter; proofs are minted against this inbox.
    const OWNER: &str = "jane@example.com";

    struct Harness {
        store: Arc<MemoryRequestStore>,
        challenges: Arc<MemoryChallengeStore>,
        verification: Arc<VerificationService>,
        updater: StatusUpdater,
    }

    fn harness_with(mailer: Arc<dyn Mailer>) -> Harness {
        let store = Arc::new(MemoryRequestStore::new());
        let challenges = Arc::new(MemoryChallengeStore::new());
        let verification = Arc::new(VerificationService::new(
            challenges.clone(),
            mailer.clone(),
        ));
        let updater = StatusUpdater::new(store.clone(), verification.clone(), mailer);
        Harness {
            store,
            challenges,
            verification,
            updater,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(RecordingMailer::new()))
    }

    impl Harness {
        async fn seeded(&self, status: RequestStatus) -> Uuid {
            let record = RequestRecord::new(sample_payload());
            let id = record.request_id;
            self.store.insert(&record).await.unwrap();
            match status {
                RequestStatus::Received => {}
                RequestStatus::Processing => {
                    self.store
                        .transition(id, RequestStatus::Received, NextState::processing())
                        .await
                        .unwrap()
                        .unwrap();
                }
                RequestStatus::Completed => {
                    self.store
                        .transition(id, RequestStatus::Received, NextState::processing())
                        .await
                        .unwrap()
                        .unwrap();
                    self.store
                        .transition(
                            id,
                            RequestStatus::Processing,
                            NextState::completed(sample_itinerary()),
                        )
                        .await
                        .unwrap()
                        .unwrap();
                }
                other => panic!("unsupported seed status {other}"),
            }
            id
        }

        async fn proof(&self, email: &str) -> Proof {
            self.verification.request_challenge(email).await.unwrap();
            let code = self.challenges.load(email).await.unwrap().unwrap().code;
            self.verification.validate_challenge(email, &code).await.unwrap()
        }
    }

    #[tokio::test]
    async fn update_without_proof_is_refused() {
        let h = harness();
        let id = h.seeded(RequestStatus::Processing).await;

        let err = h
            .updater
            .update_status(id, RequestStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::VerificationRequired));
        let record = h.store.load(id).await.unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Processing);
    }

    #[tokio::test]
    async fn made_up_proof_is_refused() {
        let h = harness();
        let id = h.seeded(RequestStatus::Processing).await;

        let err = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some("forged"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::VerificationRequired));
    }

    #[tokio::test]
    async fn proof_for_a_different_inbox_is_refused() {
        let h = harness();
        let id = h.seeded(RequestStatus::Processing).await;
        let foreign = h.proof("mallory@example.com").await;

        let err = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&foreign.token))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::VerificationRequired));
        let record = h.store.load(id).await.unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Processing);
    }

    #[tokio::test]
    async fn processing_request_can_be_cancelled() {
        let h = harness();
        let id = h.seeded(RequestStatus::Processing).await;
        let proof = h.proof(OWNER).await;

        let view = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap();

        assert_eq!(view.status, RequestStatus::Cancelled);
        assert!(view.itinerary.is_none());
    }

    #[tokio::test]
    async fn completed_request_can_be_cancelled_and_loses_its_itinerary() {
        let h = harness();
        let id = h.seeded(RequestStatus::Completed).await;
        let proof = h.proof(OWNER).await;

        let view = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap();

        assert_eq!(view.status, RequestStatus::Cancelled);
        assert!(view.itinerary.is_none());
        let record = h.store.load(id).await.unwrap().unwrap();
        assert!(record.itinerary.is_none());
    }

    #[tokio::test]
    async fn received_request_cannot_be_cancelled_but_the_proof_is_spent() {
        let h = harness();
        let id = h.seeded(RequestStatus::Received).await;
        let proof = h.proof(OWNER).await;

        let err = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::InvalidTransition {
                from: RequestStatus::Received,
                to: RequestStatus::Cancelled,
            }
        ));

        // The proof went up in smoke with the failed attempt.
        let err = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::VerificationRequired));
    }

    #[tokio::test]
    async fn administrators_cannot_force_completion() {
        let h = harness();
        let id = h.seeded(RequestStatus::Processing).await;
        let proof = h.proof(OWNER).await;

        let err = h
            .updater
            .update_status(id, RequestStatus::Completed, Some(&proof.token))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn proof_cannot_be_spent_twice() {
        let h = harness();
        let first = h.seeded(RequestStatus::Processing).await;
        let second = h.seeded(RequestStatus::Processing).await;
        let proof = h.proof(OWNER).await;

        h.updater
            .update_status(first, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap();
        let err = h
            .updater
            .update_status(second, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::VerificationRequired));
    }

    #[tokio::test]
    async fn unknown_request_reports_not_found_without_burning_the_proof() {
        let h = harness();
        let proof = h.proof(OWNER).await;

        let err = h
            .updater
            .update_status(Uuid::new_v4(), RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NotFound(_)));

        // The proof survives a lookup miss and still works.
        let id = h.seeded(RequestStatus::Processing).await;
        h.updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_update() {
        let h = harness_with(Arc::new(FailingMailer));
        let id = h.seeded(RequestStatus::Processing).await;
        // FailingMailer also fails challenge delivery; issuance still works.
        let proof = h.proof(OWNER).await;

        let view = h
            .updater
            .update_status(id, RequestStatus::Cancelled, Some(&proof.token))
            .await
            .unwrap();
        assert_eq!(view.status, RequestStatus::Cancelled);
    }
}
