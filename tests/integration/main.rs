//! Integration tests for Wayback-Mirror
//!
//! These tests use wiremock to stand in for the archive service and run the
//! full resolve, fetch and store cycle end-to-end.

mod resolution_tests;
