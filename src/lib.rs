pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod importers;
pub mod repository;
pub mod reshape;
pub mod sources;
pub mod table;
pub mod utils;
