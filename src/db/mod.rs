// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Database Access
//!
//! Clients for the hosted Supabase database, reached through its REST
//! gateway.
//!
//! ## Trust Levels
//!
//! - [`ScopedClient`] acts as the signed-in caller; row level security applies
//! - [`PrivilegedClient`] holds the service credential and bypasses it
//!
//! Privileged clients come only from [`PrivilegedClientFactory`], which
//! validates the endpoint and credential before handing one out. The factory
//! cannot tell who is asking, so actions obtain clients through
//! [`PrivilegedClientFactory::privileged_client_for`], which takes the
//! resolved [`SessionIdentity`](crate::auth::SessionIdentity).

pub mod client;
pub mod credential;
pub mod factory;
pub mod rest;

pub use client::{ClientOptions, PrivilegedClient, ScopedClient};
pub use credential::{PublishableKey, ServiceCredential};
pub use factory::{FactoryState, PrivilegedClientFactory};
pub use rest::{DataError, DataResult, Query};
