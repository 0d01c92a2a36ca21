// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Resolves the caller of a server action from its Clerk session token.
//!
//! ## Auth Flow
//!
//! 1. Web or mobile client signs the user in with Clerk
//! 2. Client calls an action with `Authorization: Bearer <session token>`
//!    (or the same-origin `__session` cookie)
//! 3. Server:
//!    - Fetches Clerk JWKS via HTTPS (cached)
//!    - Verifies signature, expiry, issuer, audience, authorized party
//!    - Extracts `sub` as the canonical user id plus the `metadata` claims
//!
//! A caller without a valid token is *anonymous*, which is a normal outcome
//! and not an error. Actions that need a caller use the [`Authenticated`]
//! extractor, which redirects anonymous callers to the sign-in page before
//! the handler body (and any privileged database access) runs.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod roles;
pub mod session;

pub use claims::{IdentityClaims, SessionIdentity};
pub use error::AuthError;
pub use extractor::{AdminOnly, Authenticated, MaybeSession};
pub use jwks::JwksManager;
pub use roles::Role;
pub use session::{SessionAuthenticator, SESSION_COOKIE, SIGN_IN_PATH};
