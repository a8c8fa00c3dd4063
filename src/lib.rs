//! SHELF Application Library
//!
//! Project modules for the SHELF service, currently the in-memory book
//! collection module.

pub mod modules;
