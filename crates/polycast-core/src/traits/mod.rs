// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seam between adapters and platform collaborators.
//!
//! Hooks use `#[async_trait]` so adapters can hold them as `Box<dyn PlatformHooks>`.

pub mod hooks;
pub mod sink;

pub use hooks::PlatformHooks;
pub use sink::EventSink;
