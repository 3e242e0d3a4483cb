//! # Smart Analyzer
//!
//! Fetch web pages, score their sentiment, extract keyword stems, and keep
//! every result in SQLite for history, search, and rollups.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  Fetch   │──▶│ Analyze  │──▶│  Store   │──▶│Aggregate │
//! │ HTTP+HTML│   │ lexicon  │   │  SQLite  │   │ rollups  │
//! └──────────┘   └──────────┘   └────┬─────┘   └──────────┘
//!                                    │
//!                      ┌─────────────┤
//!                      ▼             ▼
//!                 ┌──────────┐  ┌──────────┐
//!                 │   CLI    │  │   HTTP   │
//!                 │  (sa)    │  │  tools   │
//!                 └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sa init
//! sa analyze https://example.com/post
//! sa batch https://a.example https://b.example
//! sa keywords --min-frequency 0.02
//! sa serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Library error type |
//! | [`models`] | Records and analysis values |
//! | [`fetch`] | HTTP retrieval and text extraction |
//! | [`lexicon`] | Word lists and polarity weights |
//! | [`analyze`] | Sentiment, keywords, text statistics |
//! | [`store`] | Persistence of URLs, analyses, reports |
//! | [`pipeline`] | Per-URL, batch, and feed orchestration |
//! | [`aggregate`] | Keyword rollups and summary reports |
//! | [`tools`] | Named tool calls with parameter schemas |
//! | [`server`] | HTTP tool server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod aggregate;
pub mod analyze;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod lexicon;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod stats;
pub mod store;
pub mod tools;
