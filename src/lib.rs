#![allow(clippy::too_many_arguments)]

pub mod amount;
pub mod config;
pub mod content;
pub mod decimal;
pub mod error;
pub mod event;
pub mod handlers;
pub mod history;
pub mod indexer;
pub mod io;
pub mod ledger;
pub mod logging;
pub mod module;
pub mod script;
pub mod snapshot;
pub mod ticker;

pub use config::Config;
pub use decimal::Decimal;
pub use event::InscriptionEvent;
pub use indexer::{BRC20ModuleIndexer, Collaborators};

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
