//! value-analysis - quarterly report normalizer and intrinsic value estimator
//!
//! This library fetches quarterly reports for HK and US listings, normalizes
//! them into quarter-indexed tables, persists them as CSV, and estimates fair
//! value with a two-phase growth model.

pub mod config;
pub mod error;
pub mod provider;
pub mod quarter;
pub mod report;
pub mod storage;
pub mod utils;
pub mod valuation;
