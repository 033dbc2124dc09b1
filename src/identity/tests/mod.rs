//! Unit tests for identity records.
