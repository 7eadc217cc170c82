// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building a populated adapter manager from configuration.

use polycast_config::PolycastConfig;
use polycast_manager::AdapterManager;
use polycast_plugin::AdapterFactory;
use tracing::{info, warn};

/// A manager with every adapter that could be built and registered, plus
/// the entries that could not.
pub struct Connected {
    pub manager: AdapterManager,
    pub skipped: Vec<(String, String)>,
}

/// Build, initialize, and register every enabled adapter in `config`.
pub async fn connect(config: &PolycastConfig) -> Connected {
    let factory = AdapterFactory::new().with_auth_timeout(config.manager.auth_timeout());
    let report = factory.create_adapters_from_config(&config.adapters);

    let manager = AdapterManager::new();
    let mut skipped: Vec<(String, String)> = report
        .failures
        .into_iter()
        .map(|(name, err)| (name, err.to_string()))
        .collect();

    for (name, adapter) in report.adapters {
        if let Err(err) = manager.add_adapter(name.clone(), adapter).await {
            warn!(adapter = %name, error = %err, "adapter not registered");
            skipped.push((name, err.to_string()));
        }
    }
    info!(
        registered = manager.len(),
        skipped = skipped.len(),
        "adapters connected"
    );
    Connected { manager, skipped }
}
