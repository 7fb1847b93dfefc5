//! Convenient re-exports of the most commonly used types.
//!
//! The prelude brings the accessor, the endianness tags, the error types
//! and the option flags into scope in one line, together with
//! [`SeekFrom`] which every cursor-repositioning call takes.
//!
//! # Examples
//!
//! ```rust
//! use bytescope::prelude::*;
//!
//! let data = [0x2a, 0x00];
//! let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
//! acc.set_endianness(Endianness::Little);
//! assert_eq!(acc.read::<u16>()?, 42);
//! # Ok::<(), bytescope::Error>(())
//! ```

pub use crate::{
    Accessor, CoverageForce, CoverageRecord, Endianness, Error, PathOptions, Result, Scalar,
};

pub use std::io::SeekFrom;
