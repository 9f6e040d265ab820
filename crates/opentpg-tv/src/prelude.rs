//! Prelude for the test-vector crate.
//!
//! # Example
//!
//! ```
//! use opentpg_tv::prelude::*;
//!
//! let mut b = TvBuilder::new(3);
//! b.set(0, Val3::Zero).set(2, Val3::One);
//! assert_eq!(b.build().to_string(), "0X1");
//! ```

pub use crate::error::TvError;
pub use crate::value::Val3;
pub use crate::vector::{Tv, TvBuilder, TvPlanes};
