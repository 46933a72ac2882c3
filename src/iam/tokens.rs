// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

const REGISTRY_CHANNEL_DEPTH: usize = 64;

#[derive(Debug)]
pub enum TokenRegistryError {
    Unavailable,
}

impl std::fmt::Display for TokenRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRegistryError::Unavailable => write!(f, "Token registry is unavailable"),
        }
    }
}

impl std::error::Error for TokenRegistryError {}

/// Revocation state for issued tokens, owned by a single task so that a
/// revoke is visible to every validation that follows it. Entries carry the
/// token expiry and are pruned once the token would have expired anyway.
#[derive(Clone)]
pub struct TokenRegistry {
    sender: mpsc::Sender<RegistryCommand>,
}

enum RegistryCommand {
    Revoke {
        jti: String,
        expires_at: i64,
        reply: oneshot::Sender<()>,
    },
    IsRevoked {
        jti: String,
        reply: oneshot::Sender<bool>,
    },
}

impl TokenRegistry {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(REGISTRY_CHANNEL_DEPTH);
        tokio::spawn(async move {
            let mut state = RegistryState::new();
            state.run(receiver).await;
        });
        Self { sender }
    }

    pub async fn revoke(&self, jti: &str, expires_at: i64) -> Result<(), TokenRegistryError> {
        let (reply, receive) = oneshot::channel();
        let command = RegistryCommand::Revoke {
            jti: jti.to_string(),
            expires_at,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenRegistryError::Unavailable);
        }
        receive.await.map_err(|_| TokenRegistryError::Unavailable)
    }

    /// Whether the jti has been revoked. When the registry is unreachable
    /// this reports the token as revoked: validity cannot be vouched for, so
    /// the check fails closed.
    pub async fn is_revoked(&self, jti: &str) -> bool {
        let (reply, receive) = oneshot::channel();
        let command = RegistryCommand::IsRevoked {
            jti: jti.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return true;
        }
        receive.await.unwrap_or(true)
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct RegistryState {
    revoked: HashMap<String, i64>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            revoked: HashMap::new(),
        }
    }

    async fn run(&mut self, mut receiver: mpsc::Receiver<RegistryCommand>) {
        while let Some(command) = receiver.recv().await {
            self.cleanup_expired(Utc::now().timestamp());
            match command {
                RegistryCommand::Revoke {
                    jti,
                    expires_at,
                    reply,
                } => {
                    self.revoked.insert(jti, expires_at);
                    let _ = reply.send(());
                }
                RegistryCommand::IsRevoked { jti, reply } => {
                    let _ = reply.send(self.revoked.contains_key(&jti));
                }
            }
        }
    }

    fn cleanup_expired(&mut self, now: i64) {
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }
}
