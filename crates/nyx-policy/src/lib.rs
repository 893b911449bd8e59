//! Nyx Access Policy
//!
//! Study mode restricts navigation to urls containing a whitelisted
//! fragment. This is a focus aid, not a security boundary: matching is a
//! plain case-sensitive substring test with no url normalization.

mod access;

pub use access::{AccessPolicy, PolicyState};
