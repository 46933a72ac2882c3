// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use super::task::{CommentNotificationTask, TaskHandler};
use crate::config::NotificationConfig;
use crate::store::yaml::{read_yaml_file, write_yaml_file};

const QUEUE_FILE_NAME: &str = "queue.yaml";

#[derive(Debug)]
pub enum QueueError {
    Unavailable,
    Storage(String),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Unavailable => write!(f, "Notification queue is unavailable"),
            QueueError::Storage(msg) => write!(f, "Queue storage error: {}", msg),
        }
    }
}

impl std::error::Error for QueueError {}

/// A task that has not reached a terminal state yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedTask {
    pub id: u64,
    pub task: CommentNotificationTask,
    /// Completed (failed) attempts so far.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

/// A task that exhausted its attempts. Kept for inspection; never retried
/// automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedTask {
    pub id: u64,
    pub task: CommentNotificationTask,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
    pub last_error: String,
}

/// On-disk shape of the queue. Tasks handed to a consumer but not yet
/// acknowledged are journaled as pending, so a crash mid-attempt replays
/// them on the next start.
#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueJournal {
    next_id: u64,
    pending: Vec<QueuedTask>,
    failed: Vec<FailedTask>,
}

/// A task leased to a consumer. Must be acknowledged or rejected by id.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: u64,
    pub task: CommentNotificationTask,
    /// 1-based number of the attempt this delivery represents.
    pub attempt: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum NackOutcome {
    Requeued,
    Failed,
}

enum QueueCommand {
    Enqueue {
        task: CommentNotificationTask,
        reply: oneshot::Sender<Result<u64, QueueError>>,
    },
    Consume {
        reply: oneshot::Sender<Delivery>,
    },
    Ack {
        id: u64,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    Nack {
        id: u64,
        error: String,
        reply: oneshot::Sender<Result<NackOutcome, QueueError>>,
    },
    PendingCount {
        reply: oneshot::Sender<usize>,
    },
    FailedTasks {
        reply: oneshot::Sender<Vec<FailedTask>>,
    },
}

/// Durable notification queue. A single actor task owns the state; handles
/// are cheap clones of the command sender. Delivery is at-least-once: a
/// consumer that never acknowledges leaves the task journaled as pending.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<QueueCommand>,
}

impl NotificationQueue {
    /// Load the journal from `state_dir` and start the queue actor.
    /// Tasks left in flight by a previous run come back as pending.
    pub fn open(state_dir: &Path, config: &NotificationConfig) -> Result<Self, QueueError> {
        let journal_path = state_dir.join(QUEUE_FILE_NAME);
        let journal: QueueJournal = read_yaml_file(&journal_path, "queue")
            .map_err(|err| QueueError::Storage(err.to_string()))?
            .unwrap_or_default();

        let (sender, mut receiver) = mpsc::channel(config.channel_depth);
        let mut state = QueueState::from_journal(journal, journal_path, config.max_attempts);

        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                state.apply(command);
            }
        });

        Ok(Self { sender })
    }

    /// Durably record a task. Returns once the journal write has completed;
    /// after that the task survives a restart.
    pub async fn enqueue(&self, task: CommentNotificationTask) -> Result<u64, QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::Enqueue { task, reply })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)?
    }

    /// Wait for the next task. Resolves as soon as one is available; errors
    /// only when the queue has shut down.
    pub async fn consume(&self) -> Result<Delivery, QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::Consume { reply })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)
    }

    /// Mark a delivered task as done. It is removed from the journal.
    pub async fn ack(&self, id: u64) -> Result<(), QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::Ack { id, reply })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)?
    }

    /// Report a failed attempt. The task is requeued until it has used up
    /// its configured attempts, then parked in the failed state.
    pub async fn nack(&self, id: u64, error: &str) -> Result<NackOutcome, QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::Nack {
                id,
                error: error.to_string(),
                reply,
            })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)?
    }

    /// Pending plus in-flight tasks.
    pub async fn pending_count(&self) -> Result<usize, QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::PendingCount { reply })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)
    }

    pub async fn failed_tasks(&self) -> Result<Vec<FailedTask>, QueueError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::FailedTasks { reply })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        response.await.map_err(|_| QueueError::Unavailable)
    }
}

struct QueueState {
    journal_path: PathBuf,
    max_attempts: u32,
    next_id: u64,
    pending: VecDeque<QueuedTask>,
    in_flight: HashMap<u64, QueuedTask>,
    failed: Vec<FailedTask>,
    waiters: VecDeque<oneshot::Sender<Delivery>>,
}

impl QueueState {
    fn from_journal(journal: QueueJournal, journal_path: PathBuf, max_attempts: u32) -> Self {
        if !journal.pending.is_empty() {
            log::info!(
                "Notification queue recovered {} pending task(s)",
                journal.pending.len()
            );
        }
        Self {
            journal_path,
            max_attempts,
            next_id: journal.next_id,
            pending: journal.pending.into(),
            in_flight: HashMap::new(),
            failed: journal.failed,
            waiters: VecDeque::new(),
        }
    }

    fn apply(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Enqueue { task, reply } => {
                let result = self.enqueue(task);
                let _ = reply.send(result);
                self.dispatch_ready();
            }
            QueueCommand::Consume { reply } => {
                self.waiters.push_back(reply);
                self.dispatch_ready();
            }
            QueueCommand::Ack { id, reply } => {
                let _ = reply.send(self.ack(id));
            }
            QueueCommand::Nack { id, error, reply } => {
                let result = self.nack(id, error);
                let _ = reply.send(result);
                self.dispatch_ready();
            }
            QueueCommand::PendingCount { reply } => {
                let _ = reply.send(self.pending.len() + self.in_flight.len());
            }
            QueueCommand::FailedTasks { reply } => {
                let _ = reply.send(self.failed.clone());
            }
        }
    }

    fn enqueue(&mut self, task: CommentNotificationTask) -> Result<u64, QueueError> {
        self.next_id += 1;
        let queued = QueuedTask {
            id: self.next_id,
            task,
            attempts: 0,
            enqueued_at: Utc::now(),
        };
        self.pending.push_back(queued);

        if let Err(err) = self.persist() {
            // Never hand out an id for a task that is not on disk.
            self.pending.pop_back();
            self.next_id -= 1;
            return Err(err);
        }
        Ok(self.next_id)
    }

    fn ack(&mut self, id: u64) -> Result<(), QueueError> {
        if self.in_flight.remove(&id).is_none() {
            log::warn!("Acknowledgement for unknown task {}", id);
            return Ok(());
        }
        // The work is done either way; a journal write failure only delays
        // removal until the next successful write.
        if let Err(err) = self.persist() {
            log::warn!("Failed to journal acknowledgement of task {}: {}", id, err);
        }
        Ok(())
    }

    fn nack(&mut self, id: u64, error: String) -> Result<NackOutcome, QueueError> {
        let Some(mut queued) = self.in_flight.remove(&id) else {
            log::warn!("Rejection for unknown task {}", id);
            return Ok(NackOutcome::Requeued);
        };
        queued.attempts += 1;

        let outcome = if queued.attempts >= self.max_attempts {
            log::error!(
                "Notification task {} failed after {} attempt(s): {}",
                queued.id,
                queued.attempts,
                error
            );
            self.failed.push(FailedTask {
                id: queued.id,
                task: queued.task,
                attempts: queued.attempts,
                failed_at: Utc::now(),
                last_error: error,
            });
            NackOutcome::Failed
        } else {
            log::warn!(
                "Notification task {} attempt {} failed, requeueing: {}",
                queued.id,
                queued.attempts,
                error
            );
            self.pending.push_back(queued);
            NackOutcome::Requeued
        };

        if let Err(err) = self.persist() {
            log::warn!("Failed to journal rejection of task {}: {}", id, err);
        }
        Ok(outcome)
    }

    /// Match waiting consumers with pending tasks.
    fn dispatch_ready(&mut self) {
        while !self.waiters.is_empty() && !self.pending.is_empty() {
            let Some(queued) = self.pending.pop_front() else {
                break;
            };
            let Some(waiter) = self.waiters.pop_front() else {
                self.pending.push_front(queued);
                break;
            };
            let delivery = Delivery {
                id: queued.id,
                task: queued.task.clone(),
                attempt: queued.attempts + 1,
            };
            self.in_flight.insert(queued.id, queued);
            if let Err(delivery) = waiter.send(delivery) {
                // Consumer gave up while waiting; put the task back.
                if let Some(queued) = self.in_flight.remove(&delivery.id) {
                    self.pending.push_front(queued);
                }
            }
        }
    }

    fn persist(&self) -> Result<(), QueueError> {
        let mut pending: Vec<QueuedTask> = self
            .pending
            .iter()
            .chain(self.in_flight.values())
            .cloned()
            .collect();
        pending.sort_by_key(|task| task.id);
        let journal = QueueJournal {
            next_id: self.next_id,
            pending,
            failed: self.failed.clone(),
        };
        write_yaml_file(&self.journal_path, "queue", &journal)
            .map_err(|err| QueueError::Storage(err.to_string()))
    }
}

/// Drain the queue until shutdown is signalled. Each delivery is handed to
/// the task handler; the outcome goes back to the queue as ack or nack.
pub async fn run_worker(
    queue: NotificationQueue,
    handler: Arc<dyn TaskHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("Notification worker started");
    loop {
        let delivery = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            delivery = queue.consume() => match delivery {
                Ok(delivery) => delivery,
                Err(_) => break,
            },
        };

        match handler.handle(&delivery.task) {
            Ok(()) => {
                if let Err(err) = queue.ack(delivery.id).await {
                    log::warn!("Failed to acknowledge task {}: {}", delivery.id, err);
                }
            }
            Err(err) => {
                if let Err(err) = queue.nack(delivery.id, &err.to_string()).await {
                    log::warn!("Failed to reject task {}: {}", delivery.id, err);
                }
            }
        }
    }
    log::info!("Notification worker stopped");
}
