//! Unit tests for the sandbox crate.
