pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CommonArgs, ServerArgs};

pub use adapters::{CustomerFileParser, InMemoryFilterCache, LogNotifier};
pub use config::AppConfig;
pub use core::{InviteService, InviteSettings, ProximityFilter};
pub use domain::coordinate::Coordinate;
pub use domain::model::{Customer, OrderBy};
pub use utils::error::{InviteError, Result};
