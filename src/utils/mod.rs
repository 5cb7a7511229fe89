//! Configuration loading and validation.

#![allow(missing_docs)]

pub mod config;
