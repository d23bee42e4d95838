//! Integration test modules

mod gesture_flow_tests;
mod ordering_flow_tests;
