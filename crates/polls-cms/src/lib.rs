//! Polls extension for a page-tree CMS: question pages with voting and result
//! sub-routes, listing pages, authors, and the editor API that manages them.

pub mod config;
pub mod content;
pub mod error;
pub mod polls;
pub mod telemetry;
