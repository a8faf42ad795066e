// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Free-spin bonus state machine.
//!
//! A free-spin grant lets the player spin without debiting the balance.
//! The state is cached per session token and advanced on every spin
//! settlement. `remaining` only ever decreases, and the Active state
//! transitions to Completed exactly when it reaches zero.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-session free-spin state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FreeSpinState {
    /// No free-spin grant for this session.
    Inactive,
    /// A grant is being consumed.
    Active {
        /// Spins originally granted.
        total: u32,
        /// Spins left; strictly decreasing.
        remaining: u32,
        /// Accumulated winnings in minor units.
        win_minor: i64,
    },
    /// The grant has been exhausted.
    Completed {
        /// Spins originally granted.
        total: u32,
        /// Total winnings in minor units.
        win_minor: i64,
    },
}

impl FreeSpinState {
    /// Grant `total` free spins. A zero grant stays inactive.
    pub fn grant(total: u32) -> Self {
        if total == 0 {
            FreeSpinState::Inactive
        } else {
            FreeSpinState::Active {
                total,
                remaining: total,
                win_minor: 0,
            }
        }
    }

    /// Whether spins under this state are free (no balance debit).
    pub fn is_active(&self) -> bool {
        matches!(self, FreeSpinState::Active { .. })
    }

    /// Spins left, zero unless active.
    pub fn remaining(&self) -> u32 {
        match self {
            FreeSpinState::Active { remaining, .. } => *remaining,
            _ => 0,
        }
    }

    /// Spins originally granted, zero when inactive.
    pub fn total(&self) -> u32 {
        match self {
            FreeSpinState::Active { total, .. } | FreeSpinState::Completed { total, .. } => *total,
            FreeSpinState::Inactive => 0,
        }
    }

    /// Advance the state by one settled spin.
    ///
    /// Inactive and Completed states are unaffected; an Active state
    /// consumes one spin, accumulates the win, and completes when the
    /// last spin is used.
    pub fn apply_spin(self, spin_win_minor: i64) -> Self {
        match self {
            FreeSpinState::Active {
                total,
                remaining,
                win_minor,
            } => {
                let remaining = remaining.saturating_sub(1);
                let win_minor = win_minor + spin_win_minor;
                if remaining == 0 {
                    FreeSpinState::Completed { total, win_minor }
                } else {
                    FreeSpinState::Active {
                        total,
                        remaining,
                        win_minor,
                    }
                }
            }
            other => other,
        }
    }
}

impl Default for FreeSpinState {
    fn default() -> Self {
        FreeSpinState::Inactive
    }
}
