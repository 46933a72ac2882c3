// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod tokens;

pub use jwt::{Claims, JwtService, TOKEN_TYPE_BEARER};
pub use middleware::{AuthRequest, BearerAuthMiddlewareFactory, bearer_token, require_user};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, AuthSession};
pub use tokens::TokenRegistry;
