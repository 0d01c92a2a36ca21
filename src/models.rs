// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Table holding one row per user, keyed by the Clerk user id.
pub const PROFILES_TABLE: &str = "profiles";

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub onboarding_complete: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnboardingRequest {
    pub display_name: String,
}

/// Row written when a user completes onboarding.
#[derive(Debug, Serialize)]
pub struct ProfileUpsert<'a> {
    pub user_id: &'a str,
    pub display_name: &'a str,
    pub onboarding_complete: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_tolerates_missing_optional_columns() {
        let profile: Profile =
            serde_json::from_value(serde_json::json!({ "user_id": "user_1" })).unwrap();
        assert_eq!(profile.user_id, "user_1");
        assert!(!profile.onboarding_complete);
        assert!(profile.display_name.is_none());
    }
}
