pub mod aggregate;
pub mod analysis;
pub mod charts;
pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod stats;
pub mod table;
pub mod transform;
