//! Structure-preserving translation of CSV columns and XML documents.
//!
//! Text is routed through a [`translate::glossary::Glossary`] and an ordered
//! [`translate::chain::BackendChain`]; markup inside cells and elements is
//! segmented so only its text leaves are translated.

pub mod cli;
pub mod config;
pub mod error;
pub mod lang;
pub mod pipeline;
pub mod translate;
