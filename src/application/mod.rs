//! Application services layer: the consistency engine and its seams.

pub mod error;
pub mod hydration;
pub mod identity;
pub mod packages;
pub mod pagination;
pub mod presets;
pub mod repos;
