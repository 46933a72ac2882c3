// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Assembled notification content handed to the delivery mechanism.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationPayload {
    pub post_title: String,
    pub post_author: String,
    pub comment_author: String,
    pub comment_body: String,
    pub post_url: String,
}

#[derive(Debug)]
pub enum SinkError {
    DeliveryFailed(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::DeliveryFailed(msg) => write!(f, "Delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// External delivery boundary. Success or failure is reported synchronously
/// to the task handler; retry policy lives in the queue, not here.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), SinkError>;
}

/// Production sink: writes the notification to the log. Stands in for a
/// mail transport, mirroring what the system ships with today.
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), SinkError> {
        let rendered = serde_json::to_string(payload)
            .map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        log::info!("Comment notification sent (to={}, data={})", recipient, rendered);
        Ok(())
    }
}

/// In-memory sink for tests: records every delivery and can be primed to
/// fail a number of times first.
#[derive(Default)]
pub struct MemoryNotificationSink {
    deliveries: Mutex<Vec<(String, NotificationPayload)>>,
    fail_remaining: AtomicU32,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, times: u32) {
        self.fail_remaining.store(times, Ordering::SeqCst);
    }

    pub fn deliveries(&self) -> Vec<(String, NotificationPayload)> {
        match self.deliveries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries().len()
    }
}

impl NotificationSink for MemoryNotificationSink {
    fn deliver(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), SinkError> {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(SinkError::DeliveryFailed("primed failure".to_string()));
        }
        match self.deliveries.lock() {
            Ok(mut guard) => guard.push((recipient.to_string(), payload.clone())),
            Err(poisoned) => poisoned
                .into_inner()
                .push((recipient.to_string(), payload.clone())),
        }
        Ok(())
    }
}
