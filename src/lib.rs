//! Admin core of a block-based CMS: article model, typed block payloads,
//! tag input, and the secret-gated draft preview session.

pub mod backend;
pub mod blocks;
pub mod config;
pub mod db;
pub mod editor;
pub mod listing;
pub mod model;
pub mod notify;
pub mod preview;
pub mod scope;
pub mod tags;
