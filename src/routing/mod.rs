//! Routing subsystem for the REST surface.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route table lookup)
//!     → matcher.rs (template match, path variable capture)
//!     → Return: matched Operation + variables, MethodNotAllowed or NotFound
//! ```
//!
//! # Design Decisions
//! - The route table is fixed at compile time and immutable at runtime
//! - No regex in hot path (segment-by-segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod matcher;
pub mod router;

pub use matcher::{PathError, PathTemplate, PathVars};
pub use router::{Route, RouteMatch, RouteTable};
