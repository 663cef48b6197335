//! Serde helpers shared by the configuration and the API types.

pub mod big_int;
pub mod duration;
pub mod hash_map;
