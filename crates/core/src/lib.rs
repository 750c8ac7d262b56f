//! Core domain for the verse agent.
//!
//! Holds the types every other crate agrees on:
//! - **Domain** (`domain`) - queries, intents, verse records, pipeline results
//! - **Markup** (`markup`) - cleanup of HTML-like tags in fetched scripture text
//! - **Errors** (`errors`) - the closed pipeline failure set and its boundary mapping
//! - **Config** (`config`) - layered defaults/file/env/override configuration

pub mod config;
pub mod domain;
pub mod errors;
pub mod markup;

pub use domain::intent::{Intent, Query};
pub use domain::verse::{PipelineResult, VerseRecord};
pub use errors::{
    FailureKind, FailureRoute, InterfaceError, PipelineError, PipelineStage, ResponseClass,
};
pub use markup::strip_markup;
