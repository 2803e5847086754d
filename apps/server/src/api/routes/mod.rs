//! Route tables

pub mod packages;
