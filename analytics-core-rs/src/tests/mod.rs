//! Unit tests for the analytics core
//!
//! This module contains tests for the various components of the crate.

pub mod config_tests;
