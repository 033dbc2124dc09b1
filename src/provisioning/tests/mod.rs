//! Unit tests for provisioning.

mod support;
