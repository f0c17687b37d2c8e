//! Node subdomain
//!
//! An inference node is an addressable endpoint hosting one or more models.
//! The [`registry::NodeRegistry`] is the in-memory roster of configured
//! nodes; [`entities::NodeHealth`] is the ephemeral result of probing one.

pub mod entities;
pub mod registry;
pub mod status;
