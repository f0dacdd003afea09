//! Plume Core Types
//!
//! This crate provides the foundational types shared by the Plume modeling
//! engine. It includes:
//!
//! - **Identifiers**: Interned element identifiers ([`identifier::ElementId`])
//! - **Colors**: RGBA color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points and affine transforms ([`geometry`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
