//! Readers for the individual `/proc` sources.

pub mod cpu;
pub mod memory;
pub mod process;
pub mod processor;
pub mod system;
pub mod users;
