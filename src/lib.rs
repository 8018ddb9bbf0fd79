//! Structural snapshots of PostgreSQL databases.
//!
//! [`describe::describe_tables`] and [`describe::describe_views`] enumerate
//! the user schemas, list every table or view, run the catalog collectors for
//! each one and merge everything into a single serializable
//! [`report::Report`]. A failure while describing one entity leaves that
//! entity out; only failures of the enumeration itself abort the call.

pub mod connect;
pub mod describe;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod report;
pub mod resource;
#[cfg(test)]
mod testutil;
