// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod queue;
pub mod sink;
pub mod task;

pub use queue::{Delivery, FailedTask, NackOutcome, NotificationQueue, QueueError, run_worker};
pub use sink::{LogNotificationSink, NotificationPayload, NotificationSink, SinkError};
pub use task::{CommentNotificationTask, CommentNotifier, TaskError, TaskHandler};
