// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for relay abuse gate attack simulation.
//!
//! Attacks run against an in-memory store on a simulated clock, so every
//! outcome count is deterministic.

pub mod attacks;
pub mod generators;
pub mod metrics;
