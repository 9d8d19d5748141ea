//! Convenient re-exports for common usage.
//!
//! ```
//! use crdt_toolbox::prelude::*;
//! ```

pub use crate::Crdt;
pub use crate::CrdtError;
pub use crate::EMSet;
pub use crate::GCounter;
pub use crate::GSet;
pub use crate::LWWSet;
pub use crate::ORSet;
pub use crate::PNCounter;
pub use crate::SetCrdt;
pub use crate::TwoPSet;
