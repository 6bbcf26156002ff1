//! Regroup - collection-aware projection rewriting
//!
//! This crate rewrites query projections that select entity-owned
//! collections into flat, fixed-arity tuples, and builds the program that
//! regroups the executed rows back into one result per entity:
//! - Entity catalogs describing member types
//! - Projection text parsing and lowering to typed expressions
//! - Projection rewriting and post-processing transform synthesis
//! - Evaluation of transforms over executed rows

pub mod config;
pub mod entity_catalog;
pub mod projection_parser;
pub mod query_planner;
pub mod result_transformer;
