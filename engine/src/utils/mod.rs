//! Utility functions shared by the compilers

pub mod sql;
