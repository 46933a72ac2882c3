// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

mod auth;
mod comments;
mod posts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/refresh", web::post().to(auth::refresh))
                    .route("/me", web::get().to(auth::me)),
            )
            .route("/tags", web::post().to(posts::create_tag))
            .route("/posts", web::post().to(posts::create_post))
            .route("/posts/{id}", web::get().to(posts::get_post))
            .route("/posts/{id}/tags/attach", web::post().to(posts::attach_tags))
            .route("/posts/{id}/tags/detach", web::post().to(posts::detach_tags))
            .route("/posts/{id}/tags/sync", web::post().to(posts::sync_tags))
            .route("/comments", web::post().to(comments::create_comment)),
    );
}
