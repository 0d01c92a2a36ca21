// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cupping Server - server actions for the coffee cupping trainer
//!
//! Every action resolves the caller's Clerk session first and only then may
//! reach the Supabase database, either as the caller (row-level policy
//! applies) or with the service credential.
//!
//! ## Modules
//!
//! - `api` - HTTP actions (Axum) and OpenAPI document
//! - `auth` - Session authentication (Clerk JWT)
//! - `db` - Scoped and privileged database clients
//! - `config` - Process configuration read once at startup
//! - `telemetry` - Logging setup

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod test_support;
