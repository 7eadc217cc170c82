// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter factory and built-in platform catalog.
//!
//! Every platform is compiled in; the factory maps a [`PlatformType`] and an
//! [`AdapterConfig`] onto the matching collaborator from
//! `polycast-platforms` and wraps it in an [`Adapter`].
//!
//! [`PlatformType`]: polycast_core::PlatformType
//! [`AdapterConfig`]: polycast_config::AdapterConfig
//! [`Adapter`]: polycast_adapter::Adapter

pub mod catalog;
pub mod factory;

pub use catalog::{builtin_catalog, search_catalog, CatalogEntry};
pub use factory::{AdapterFactory, BuildReport, DEFAULT_RATE_LIMIT, DEFAULT_RETRY};
