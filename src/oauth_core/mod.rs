//! OAuth2 credential engine core: types, scope matching, grant flows,
//! the capability contract and its in-memory implementation.

pub mod engine;
pub mod grants;
pub mod memory;
pub mod provider;
pub mod scope;
pub mod types;
