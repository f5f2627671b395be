// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Age-based freshness windows

use std::time::{Duration, Instant};

/// A value is fresh while its age is strictly below the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    window: Duration,
}

impl FreshnessPolicy {
    /// Policy with the given window
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// The configured window
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Whether a value fetched at `fetched_at` is still fresh
    pub fn is_fresh(&self, fetched_at: Instant) -> bool {
        self.is_fresh_at(fetched_at, Instant::now())
    }

    /// Freshness relative to an explicit `now`
    pub fn is_fresh_at(&self, fetched_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(fetched_at) < self.window
    }
}
