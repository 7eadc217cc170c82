// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Polycast.
//!
//! Defines the values every other crate exchanges: capability descriptors,
//! content and result types, adapter events, the error taxonomy, and the
//! [`PlatformHooks`] trait that platform collaborators implement.

pub mod capability;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use capability::{CapabilityDescriptor, Operation};
pub use error::PolycastError;
pub use events::{AdapterEvent, ADAPTER_EVENT_NAMES};
pub use traits::{EventSink, PlatformHooks};
pub use types::{
    ActionResult, ContentItem, ContentMetrics, ContentType, MediaItem, PlatformType,
    RateLimitInfo, SearchOptions, UserProfile,
};
