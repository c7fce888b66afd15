use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::error::BookingError;

/// Raw scheduler answer: `{success, confirmationId?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_id: Option<String>,
}

/// Confirmation shown to the user once an appointment is booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub confirmation_id: String,
    pub booked_at: DateTime<Utc>,
}

impl TryFrom<BookingReceipt> for BookingConfirmation {
    type Error = BookingError;

    fn try_from(receipt: BookingReceipt) -> Result<Self, Self::Error> {
        if !receipt.success {
            return Err(BookingError::Declined);
        }

        let confirmation_id = receipt
            .confirmation_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(BookingError::MissingConfirmation)?;

        Ok(Self {
            confirmation_id,
            booked_at: Utc::now(),
        })
    }
}

/// Outbound scheduling hook.
#[async_trait]
pub trait AppointmentBooker: Send + Sync {
    async fn book(&self) -> Result<BookingReceipt, BookingError>;
}

/// Stand-in scheduler that waits, then always confirms.
#[derive(Debug, Clone)]
pub struct SimulatedBooker {
    latency: Duration,
}

impl SimulatedBooker {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedBooker {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl AppointmentBooker for SimulatedBooker {
    async fn book(&self) -> Result<BookingReceipt, BookingError> {
        debug!(latency_ms = self.latency.as_millis() as u64, "simulating booking");
        tokio::time::sleep(self.latency).await;

        Ok(BookingReceipt {
            success: true,
            confirmation_id: Some(synthetic_confirmation_id()),
        })
    }
}

fn synthetic_confirmation_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("MA-{}", hex[..8].to_ascii_uppercase())
}
