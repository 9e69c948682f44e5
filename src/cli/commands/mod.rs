pub mod config;
pub mod guide;
pub mod serve;
pub mod tables;
