//! Application services layer.

pub mod archive;
pub mod cities;
pub mod error;
pub mod repos;
pub mod trends;
