//! Existence Client Module
//!
//! Talks to the search clusters. One batched multi-get per call, answered with
//! an `ExistenceMap` covering every identifier that was asked about.
//!
//! ## Submodules
//! - **`existence`**: The `ExistenceClient` and the generic retry loop it uses.
//! - **`protocol`**: Wire format of the multi-get request and response.

pub mod existence;
pub mod protocol;

pub use existence::{ExistenceClient, with_retry};
