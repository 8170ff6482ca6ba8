//! msibind-lib: bind-time engine for installer packages
//!
//! This crate turns the relational intermediate form of an installer package
//! into deterministic build artifacts:
//! - `table`: tables, rows and fields with change tracking
//! - `guid`: content-derived component GUIDs
//! - `media`: assignment of files to cabinets and file sequencing
//! - `transform`: target/updated snapshots for patch transforms
//! - `chain`: package order and rollback boundaries for bundles
//! - `binder`: the product, patch and bundle bind passes

pub mod binder;
pub mod cabinet;
pub mod chain;
pub mod collab;
pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod guid;
pub mod media;
pub mod persist;
pub mod table;
pub mod transform;
