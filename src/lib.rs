//! # Planscan
//!
//! A discipline-aware project file scanner. Planscan periodically
//! enumerates engineering files (DWG/PDF drawings and the like) from a
//! local directory tree or a remote object store, groups them into
//! discipline buckets, caches the result as a single JSON document, and
//! serves it through a small authenticated HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────┐
//! │  ScanSource  │──▶│ TreeWalker   │──▶│ Orchestr. │──┐
//! │ local/remote │   │ (worklist)  │   │ +Classif. │  │
//! └──────────────┘   └─────────────┘   └───────────┘  ▼
//!                                              ┌────────────┐
//!                       notes ───────────────▶ │ JSON cache │
//!                                              └─────┬──────┘
//!                    ┌────────────┐                  │
//!  interval/refresh ─▶│ scan loop  │           ┌─────▼─────┐
//!                    └────────────┘           │ HTTP API  │
//!                                             └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Scan result, file record, and change-set types |
//! | [`size`] | Human-readable byte formatting |
//! | [`classify`] | Keyword-based discipline classification |
//! | [`source`] | `ScanSource` capability trait |
//! | [`source_fs`] | Local filesystem source |
//! | [`source_remote`] | Paginated remote object-store source |
//! | [`walker`] | Worklist-based recursive tree walk |
//! | [`scan`] | Scan orchestration and cache-refresh driver |
//! | [`diff`] | Change detection between scans |
//! | [`error`] | Scan-layer error taxonomy |
//! | [`cache`] | Atomic JSON cache persistence |
//! | [`notes`] | Free-text annotations keyed by discipline + filename |
//! | [`auth`] | HMAC bearer tokens and the allow-list predicate |
//! | [`server`] | Axum HTTP API |
//! | [`sched`] | Interval ticker and coalescing scan worker |

pub mod auth;
pub mod cache;
pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod models;
pub mod notes;
pub mod scan;
pub mod sched;
pub mod server;
pub mod size;
pub mod source;
pub mod source_fs;
pub mod source_remote;
pub mod walker;
