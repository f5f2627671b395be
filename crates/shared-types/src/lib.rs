// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the wallet data service
//!
//! This crate provides the chain identifiers and the runtime chain registry
//! used across the workspace, avoiding circular dependencies.

pub mod chains;
pub mod registry;

pub use chains::{ChainId, ChainIdParseError};
pub use registry::{Chain, ChainRegistry};
