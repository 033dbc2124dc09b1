//! Unit tests for runtime configuration.
