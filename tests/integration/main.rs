//! Integration tests for alacena
//! These drive the real reqwest transport against a local mock backend

mod test_harness;

mod api_test;
mod gateway_test;
