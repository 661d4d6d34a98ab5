//! # Knowledge Base Ingest
//!
//! A document chunking-and-embedding pipeline for coaching knowledge bases.
//!
//! `kb-ingest` reads a fixed set of curated source documents, segments each
//! one with a family-specific strategy (tactics catalogs, Q&A transcripts,
//! webinars, narratives, blocker protocols, client avatars, practice
//! guides), routes financing-related passages to a secondary collection,
//! generates an embedding vector per passage via the OpenAI API, and
//! persists everything to a local SQLite database.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌───────────────┐
//! │  Loader  │──▶│ Segmenters │──▶│ Router  │──▶│ Embed + Sink  │
//! │ (files)  │   │ (7 families)│   │(financing)│ │ OpenAI→SQLite │
//! └──────────┘   └────────────┘   └─────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kbi init                      # create database
//! kbi sources                   # check every source file exists
//! kbi ingest --dry-run          # passage counts, no API calls
//! kbi ingest                    # full run
//! kbi stats                     # what landed
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Source document loading |
//! | [`segment`] | Family-specific segmenters |
//! | [`route`] | Financing keyword routing |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`pipeline`] | Sequential ingestion driver |
//! | [`sink`] | Idempotent passage persistence |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod route;
pub mod segment;
pub mod sink;
pub mod sources;
pub mod stats;
