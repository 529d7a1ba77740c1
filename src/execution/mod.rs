//! Operation execution: the pipeline executor, operation data, and the client

pub mod client;
pub mod executor;
pub mod operation;

pub use client::{Client, Output};
pub use executor::{execute, Pipeline};
pub use operation::OperationSpec;
