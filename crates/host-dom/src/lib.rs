//! Host page port
//!
//! The automation core never owns the page it drives. This crate describes the
//! small set of DOM capabilities it relies on:
//! - element discovery by CSS selector, id and form ancestry
//! - element state (visibility, disabled flags, attributes)
//! - text reads and framework-visible writes for plain and rich fields
//! - cursor snapshots for trigger detection
//!
//! Element references are weak: a reference obtained earlier may point at a
//! node the host has since removed, in which case `describe` yields `None`.

pub mod element;
pub mod errors;
pub mod memory;
pub mod page;
pub mod text;

pub use element::*;
pub use errors::*;
pub use memory::{DomEvent, DomEventKind, MemoryDom, MemoryPage, NodeSpec};
pub use page::*;
