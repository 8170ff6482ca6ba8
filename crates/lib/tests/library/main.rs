//! End-to-end tests of the bind passes through the public API.

mod bundle_tests;
mod common;
mod patch_tests;
mod product_tests;
