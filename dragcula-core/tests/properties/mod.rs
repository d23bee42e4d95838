//! Property test modules

mod drop_position_tests;
mod pin_policy_tests;
mod reconcile_tests;
