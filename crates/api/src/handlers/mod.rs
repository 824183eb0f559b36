//! Request handlers.
//!
//! Each submodule adapts HTTP requests onto the matching [`crate::engine`]
//! module and wraps results in the display projections from
//! [`crate::views`].

pub mod engagement;
pub mod invoice;
pub mod todo;
