// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter registry and coordinator.
//!
//! [`AdapterManager`] owns a set of named adapters, forwards their events
//! tagged with the registry name, and fans operations out to all of them
//! concurrently. A failing, panicking, or incapable adapter never affects
//! the outcome reported for any other.

pub mod events;
pub mod manager;

pub use events::{ManagerEvent, MANAGER_EVENT_NAMES};
pub use manager::{AdapterManager, DisconnectReport};
