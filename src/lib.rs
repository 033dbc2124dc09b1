//! Accountsync: corporate account provisioning engine.
//!
//! This crate turns HR person records into accounts at three identity
//! providers: the directory (single sign-on), enterprise chat, and mail.
//! Work is tracked as durable provisioning tasks with dependencies, a capped
//! retry history, and per-attempt failure logs.
//!
//! # Architecture
//!
//! Accountsync follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, memory)
//!
//! # Modules
//!
//! - [`config`]: Layered key/value configuration
//! - [`identity`]: Persons, accounts, mappings, and email reservations
//! - [`provisioning`]: Task creation, execution, retry, and batch runs

pub mod config;
pub mod identity;
pub mod provisioning;
