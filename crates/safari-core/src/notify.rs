//! Transactional email content.
//!
//! Builders only - transport lives behind the [`Mailer`] port and every
//! send in the system is best-effort.
//!
//! [`Mailer`]: crate::ports::Mailer

use safari_types::RequestStatus;

use crate::challenge::VerificationChallenge;
use crate::ports::EmailMessage;
use crate::record::RequestRecord;

pub fn verification_email(challenge: &VerificationChallenge) -> EmailMessage {
    let hours = (challenge.expires_at - challenge.issued_at).num_hours();
    EmailMessage {
        to: challenge.email.clone(),
        subject: "Your Great Rift Safari verification code".into(),
        html_body: format!(
            "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
             <h2>Verification Code</h2>\
             <p>Use this code to confirm changes to your safari request:</p>\
             <p style=\"font-size: 28px; font-weight: bold; letter-spacing: 4px;\">{code}</p>\
             <p>The code expires in {hours} hours and can be used once.</p>\
             <p>If you did not request this, you can ignore this email.</p>\
             </body></html>",
            code = challenge.code,
        ),
    }
}

pub fn completion_email(record: &RequestRecord) -> EmailMessage {
    let dates = &record.payload.travel_dates;
    EmailMessage {
        to: record.email.clone(),
        subject: "Your safari itinerary is ready".into(),
        html_body: format!(
            "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
             <h2>Your itinerary is ready!</h2>\
             <p>We have finished planning your safari from {start} to {end}.</p>\
             <p>Request reference: <strong>{id}</strong></p>\
             <p>Use the reference above to view your full day-by-day plan.</p>\
             </body></html>",
            start = dates.start_date,
            end = dates.end_date,
            id = record.request_id,
        ),
    }
}

pub fn status_change_email(record: &RequestRecord, from: RequestStatus) -> EmailMessage {
    EmailMessage {
        to: record.email.clone(),
        subject: format!("Safari request update: {}", record.status),
        html_body: format!(
            "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
             <h2>Request status changed</h2>\
             <p>Request <strong>{id}</strong> moved from {from} to {to}.</p>\
             <p>If this was not expected, please contact us.</p>\
             </body></html>",
            id = record.request_id,
            to = record.status,
        ),
    }
}
