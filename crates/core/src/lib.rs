//! Domain core for the portfolio service: sections, sub-items and their media
//! collections, plus the collaborators (database, blob storage, auth) they
//! are persisted through.

pub mod auth;
pub mod content;
pub mod events;
pub mod media;
pub mod model;
pub mod repo;
pub mod storage;
