// SPDX-License-Identifier: Apache-2.0
//! Persisted configuration for the transport scheduler daemon: which
//! dispatch policy to start with, and the tunables spec §9 lists as
//! advisory defaults.

mod fs;
mod settings;
mod store;

pub use fs::FsConfigStore;
pub use settings::{FabcellConfig, PheromoneSettings, PolicyKind, SETTINGS_KEY};
pub use store::{ConfigError, ConfigService, ConfigStore};
