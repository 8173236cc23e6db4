// crates/surveyor-aws/src/notify.rs
// ============================================================================
// Module: Owner Notification Sink
// Description: Owner-email discovery and SES delivery for inspection findings.
// Purpose: Route non-compliance summaries to the address tagged on the
//          inspected resource without ever failing the inspection itself.
// Dependencies: async-trait, aws-sdk-ses, serde_json, surveyor-core
// ============================================================================

//! ## Overview
//! Resources carry their owner's address as a tag under one of a small set of
//! conventional key spellings. [`find_owner_email`] scans a tag map for those
//! keys case-insensitively and returns the first match. [`SesNotificationSink`]
//! implements the core [`NotificationSink`] seam over Amazon SES. Delivery
//! failures are returned to the caller for auditing; callers must never let
//! them fail the invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_sdk_ses::types::Body;
use aws_sdk_ses::types::Content;
use aws_sdk_ses::types::Destination;
use aws_sdk_ses::types::Message;
use serde_json::Map;
use serde_json::Value;
use surveyor_core::NotificationSink;
use surveyor_core::NotifyError;
use surveyor_core::OwnerNotice;

use crate::clients::AwsClients;

// ============================================================================
// SECTION: Owner Discovery
// ============================================================================

/// Tag key spellings that carry an owner email address, compared
/// case-insensitively.
const OWNER_TAG_KEYS: [&str; 4] = ["owner_email", "owner-email", "email", "owneremail"];

/// Returns the owner email address recorded in a resource tag map, if any.
///
/// Keys are matched case-insensitively against the conventional spellings in
/// [`OWNER_TAG_KEYS`]. When several keys match, the first in the map's key
/// order wins.
#[must_use]
pub fn find_owner_email(tags: &Map<String, Value>) -> Option<String> {
    for (key, value) in tags {
        let lowered = key.to_lowercase();
        if OWNER_TAG_KEYS.contains(&lowered.as_str()) {
            if let Some(address) = value.as_str() {
                return Some(address.to_string());
            }
        }
    }
    None
}

// ============================================================================
// SECTION: SES Sink
// ============================================================================

/// Notification sink that delivers owner notices through Amazon SES.
#[derive(Debug, Clone)]
pub struct SesNotificationSink {
    /// Shared AWS service clients.
    clients: AwsClients,
    /// Verified sender address used as the message source.
    sender: String,
}

impl SesNotificationSink {
    /// Creates an SES sink sending from `sender`.
    #[must_use]
    pub fn new(clients: AwsClients, sender: String) -> Self {
        Self {
            clients,
            sender,
        }
    }
}

#[async_trait]
impl NotificationSink for SesNotificationSink {
    async fn notify(&self, notice: &OwnerNotice) -> Result<(), NotifyError> {
        let subject = Content::builder()
            .data(&notice.subject)
            .build()
            .map_err(|err| NotifyError::Dispatch(format!("subject assembly: {err}")))?;
        let text = Content::builder()
            .data(&notice.body)
            .build()
            .map_err(|err| NotifyError::Dispatch(format!("body assembly: {err}")))?;
        let destination = Destination::builder().to_addresses(&notice.recipient).build();
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().text(text).build())
            .build()
            .map_err(|err| NotifyError::Dispatch(format!("message assembly: {err}")))?;
        self.clients
            .ses
            .send_email()
            .source(&self.sender)
            .destination(destination)
            .message(message)
            .send()
            .await
            .map_err(|err| NotifyError::Dispatch(format!("SendEmail: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
