//! Vault kit end-to-end tests against in-memory chain state.
#![allow(missing_docs, unreachable_pub)]

mod cases;
mod environment;
