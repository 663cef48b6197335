//! Shared primitive types and contract bindings.

mod erc20;
pub use erc20::*;

mod erc4626;
pub use erc4626::*;

mod morpho;
pub use morpho::*;
