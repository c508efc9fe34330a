pub mod domain;
pub mod names;
pub mod patterns;
pub mod polling;
pub mod records;
