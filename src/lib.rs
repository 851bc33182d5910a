//! Broadside server
//!
//! Authoritative ship battle rooms: a fixed-rate simulation per room, command
//! handling over WebSocket and snapshot broadcast, plus the client-side
//! interpolation buffer that smooths those snapshots for rendering.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
