//! Integration tests for `Dragcula` core
//!
//! These drive complete gestures through a coordinator over an element tree
//! into the tab and notebook appliers.

#![allow(clippy::similar_names)]

mod integration;
