// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by the adapter manager.

use std::collections::BTreeMap;

use polycast_bus::NamedEvent;
use polycast_core::{ActionResult, AdapterEvent, PlatformType};

/// Names of the manager's own events.
pub const MANAGER_EVENT_NAMES: [&str; 4] = [
    "adapter-added",
    "adapter-removed",
    "adapter-error",
    "bulk-complete",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// An adapter event re-emitted under its original name, tagged with the
    /// registry name of the adapter it came from.
    Adapter { adapter: String, event: AdapterEvent },
    AdapterAdded { name: String, platform: PlatformType },
    AdapterRemoved { name: String },
    AdapterError { name: String, message: String },
    /// Every leg of a fan-out call has settled.
    BulkComplete {
        operation: String,
        results: BTreeMap<String, ActionResult>,
    },
}

impl ManagerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ManagerEvent::Adapter { event, .. } => event.name(),
            ManagerEvent::AdapterAdded { .. } => "adapter-added",
            ManagerEvent::AdapterRemoved { .. } => "adapter-removed",
            ManagerEvent::AdapterError { .. } => "adapter-error",
            ManagerEvent::BulkComplete { .. } => "bulk-complete",
        }
    }

    /// Registry name of the adapter the event concerns, if any.
    pub fn adapter(&self) -> Option<&str> {
        match self {
            ManagerEvent::Adapter { adapter, .. } => Some(adapter),
            ManagerEvent::AdapterAdded { name, .. }
            | ManagerEvent::AdapterRemoved { name }
            | ManagerEvent::AdapterError { name, .. } => Some(name),
            ManagerEvent::BulkComplete { .. } => None,
        }
    }
}

impl NamedEvent for ManagerEvent {
    fn event_name(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_events_keep_their_name() {
        let event = ManagerEvent::Adapter {
            adapter: "main".to_string(),
            event: AdapterEvent::Ready,
        };
        assert_eq!(event.name(), "ready");
        assert_eq!(event.adapter(), Some("main"));
    }

    #[test]
    fn own_event_names_are_listed() {
        let events = [
            ManagerEvent::AdapterAdded {
                name: "a".to_string(),
                platform: PlatformType::Slack,
            },
            ManagerEvent::AdapterRemoved {
                name: "a".to_string(),
            },
            ManagerEvent::AdapterError {
                name: "a".to_string(),
                message: "boom".to_string(),
            },
            ManagerEvent::BulkComplete {
                operation: "post".to_string(),
                results: BTreeMap::new(),
            },
        ];
        let names: Vec<&str> = events.iter().map(ManagerEvent::name).collect();
        assert_eq!(names, MANAGER_EVENT_NAMES.to_vec());
        assert_eq!(events[3].adapter(), None);
    }
}
