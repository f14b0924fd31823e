//! # Portals Inventory - farming inventory engine for a hosted game world
//!
//! The engine keeps the authoritative model of what the player holds: a bounded
//! set of item stacks with unique ids, positive quantities and a slot cap. The
//! game host drives it with JSON commands and is told the outcome of every
//! command through task notifications carrying a target-state token.
//!
//! ## Features
//!
//! - **Item Store**: capacity-checked stacks, merge on re-add, partial and full removal.
//! - **Transactions**: crafting, tool upgrades, harvesting and planting validate the
//!   whole store before the first mutation, so a failure changes nothing.
//! - **Host Protocol**: thirteen actions routed through an action table, failures
//!   reported as tagged notifications instead of escaping the listener loop.
//! - **Persistence**: best-effort JSON blob saved after every mutation to a file,
//!   sled or in-memory backend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portals_inventory::config::Config;
//! use portals_inventory::engine::InventoryEngine;
//! use portals_inventory::persistence::open_backend;
//! use portals_inventory::protocol::StdioTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let backend = open_backend(&config.storage)?;
//!     let engine = InventoryEngine::new(
//!         &config.inventory,
//!         backend,
//!         Box::new(StdioTransport::new()),
//!     );
//!     engine.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`inventory`] - item store, crafting resolver, variable mirror and failure kinds
//! - [`dispatch`] - action table and payload decoding
//! - [`protocol`] - inbound messages, notifications, target-state tokens, transports
//! - [`persistence`] - blob format, persistence gateway and storage backends
//! - [`engine`] - wiring and the listener loop
//! - [`config`] - TOML configuration
//!
//! ```text
//! host ──► transport ──► engine ──► dispatcher ──► item store / resolver
//!                          │                            │
//!                          │◄── flush ── persistence ◄──┘
//!                          └──► notification emitter ──► host
//! ```

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod inventory;
pub mod logutil;
pub mod persistence;
pub mod protocol;
