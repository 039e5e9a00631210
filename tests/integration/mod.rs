//! Integration tests module
//!
//! This module organizes all integration tests for the r-ambient application.

pub mod audio_test;
pub mod config_test;
pub mod player_test;
