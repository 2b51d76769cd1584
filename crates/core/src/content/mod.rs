pub mod seed;
pub mod service;

pub use seed::{default_sections, seed_default_sections};
pub use service::{
    ContentError, ContentResult, ContentService, PortfolioItem, PortfolioMedia, PortfolioSection,
};
