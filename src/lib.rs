//! # feedsky
//!
//! Mirrors a single RSS feed to a Bluesky account, posting each new item
//! exactly once.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Publisher ─┬→ Preview → Composer → Bluesky
//!                                   └→ Ledger (posted GUIDs, session)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export BLUESKY_USER=me.bsky.social BLUESKY_PASS=app-password
//!
//! # See what would be posted
//! feedsky publish --dry-run
//!
//! # Post at most one new item
//! feedsky publish --one
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the ledger,
/// the HTTP stack and the posting-service client.
pub mod app;

/// XRPC client for the posting service and the session manager.
pub mod bluesky;

/// Command-line interface using clap.
///
/// - `publish [--dry-run] [--all] [--one | --number N]` - Post new items
/// - `profile` - Print the account profile
pub mod cli;

/// Post text, rich-text facets and link cards.
pub mod composer;

/// Configuration loaded from `~/.config/feedsky/config.toml`.
pub mod config;

/// Core domain models: feed items, sessions and post records.
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for GET requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing into [`FeedItem`](domain::FeedItem)s.
pub mod normalizer;

/// Open Graph link previews.
pub mod preview;

/// The deduplicating publish loop.
pub mod publisher;

/// Ledger of posted GUIDs and the cached session.
///
/// - [`Ledger`](store::Ledger): Trait defining the key to bytes store
/// - [`SqliteLedger`](store::SqliteLedger): SQLite implementation
pub mod store;
