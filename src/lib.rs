//! # Photon Runtime
//!
//! A single-file program runtime that exposes a user-authored TypeScript
//! module as a Model Context Protocol (MCP) server. A user writes one
//! source file declaring a class; its public methods become MCP tools
//! (and, by docblock annotation, prompts and resources). The runtime
//! loads that file, derives a catalog from static analysis of its source,
//! instantiates the class with configuration drawn from the environment,
//! and serves it over stdio, HTTP+SSE, or a local IPC socket.
//!
//! ## Architecture
//!
//! - [`analyzer`] parses one source file into a [`model::SpecSkeleton`]
//!   without executing any of it.
//! - [`loader`] strips TypeScript types, caches the result by content
//!   hash, and instantiates the user class inside an embedded JS engine.
//! - [`instance`] holds the loaded photon and its derived catalog.
//! - [`invocation`] validates arguments, runs a tool call with a scoped
//!   context, and coerces the result into MCP content blocks.
//! - [`session`] tracks per-connection state: subscriptions, in-flight
//!   invocations, pending elicitations.
//! - [`protocol`] is the JSON-RPC 2.0 framing and MCP method dispatch.
//! - [`transport`] carries frames over stdio, HTTP+SSE, or local IPC.
//! - [`broker`] fans out channel publications to subscribed sessions.
//! - [`watcher`] reloads the photon on source file changes.
//! - [`marketplace`] and [`upgrade`] resolve and install photons by name
//!   from git-hosted manifests.
//! - [`config`] resolves runtime configuration and persists the
//!   marketplace list, install registry, and per-photon configuration.
//! - [`host`] ties all of the above into the one long-lived object every
//!   transport dispatches through.

pub mod analyzer;
pub mod broker;
pub mod config;
pub mod error;
pub mod host;
pub mod instance;
pub mod invocation;
pub mod loader;
pub mod marketplace;
pub mod model;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod upgrade;
pub mod watcher;

pub use config::RuntimeConfig;
pub use error::{PhotonError, PhotonResult};
pub use host::PhotonHost;
pub use instance::PhotonInstance;
pub use model::PhotonSpec;
