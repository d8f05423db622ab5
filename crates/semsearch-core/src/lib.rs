#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod context;
pub mod error;
pub mod keys;
pub mod snapshot;
pub mod traits;
pub mod types;
