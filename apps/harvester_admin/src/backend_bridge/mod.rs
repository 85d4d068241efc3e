//! Backend bridge: command queue from UI to a storage worker thread.

pub mod commands;
pub mod runtime;
