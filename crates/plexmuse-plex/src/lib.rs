// SPDX-License-Identifier: GPL-3.0-or-later

//! Plex Media Server client for browsing music libraries and creating playlists.
//!
//! Only the handful of library endpoints needed to enumerate artists, albums
//! and tracks and to publish audio playlists are covered. Responses are
//! requested as JSON.

pub mod client;
pub mod error;
pub mod models;

pub use client::{PlexClient, PlexClientBuilder};
pub use error::{PlexError, Result};
pub use models::{Directory, Identity, Metadata, PlexItemType, Tag};
