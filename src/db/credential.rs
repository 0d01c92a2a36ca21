// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key material for the database gateway.
//!
//! Neither type implements `Serialize` or `Display`, and `Debug` prints a
//! placeholder. The raw value is only reachable through `expose()`, which is
//! called when a request header is built.

use std::fmt;

/// The service-role key. Bypasses row level security.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential(String);

impl ServiceCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceCredential(<redacted>)")
    }
}

/// The publishable (anon) key. Safe to ship to browsers, but it still has no
/// business in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishableKey(String);

impl PublishableKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for PublishableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PublishableKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_secret() {
        let key = ServiceCredential::new("super-secret-service-key");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert_eq!(key.expose(), "super-secret-service-key");
    }

    #[test]
    fn blank_detection_trims_whitespace() {
        assert!(ServiceCredential::new("  ").is_blank());
        assert!(PublishableKey::new("").is_blank());
        assert!(!PublishableKey::new("anon").is_blank());
    }
}
