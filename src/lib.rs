// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'accessor/mod.rs' uses mmap to map a file window into memory

//! # bytescope
//!
//! A cursor-based reader/writer for typed binary data over memory buffers and files,
//! with endianness control, nested windowed sub-accessors sharing one storage, and a
//! coverage log recording which byte ranges have been consumed and why. Built in pure
//! Rust, `bytescope` is the storage-and-codec layer for tools that parse arbitrary
//! binary container formats - archives, saved games, on-disk structures - and produce
//! annotated maps of file layout.
//!
//! # Architecture
//!
//! The library is organized into a few modules that work together:
//!
//! - **Accessor layer**: One [`Accessor`] type for root accessors and read-only
//!   sub-accessors, each with its own window, cursor, endianness, cursor stack and
//!   coverage log
//! - **Storage layer**: Borrowed memory, owned buffers, memory-mapped file windows,
//!   and growable zero-filled write buffers flushed to a file on close
//! - **Codec layer**: Endian-parameterised scalars and arrays, 24-bit and N-byte
//!   integers, LEB128 varint and zig-zag, raw blocks, and C / Pascal / fixed-length /
//!   padded / 16-bit / 32-bit string shapes
//! - **Coverage layer**: Per-accessor consumption records with sort-and-merge
//!   summarisation under caller-overridable comparators
//!
//! ## Key Components
//!
//! - [`Accessor`] - Main entry point: open, read, write, slice, close
//! - [`Endianness`] - Byte order tags {Big, Little, Native, Reverse} and the
//!   process-wide default
//! - [`Scalar`] - The conversion trait behind the generic typed operations
//! - [`CoverageRecord`] - One consumed region of an accessor's window
//! - [`Error`] and [`Result`] - Comprehensive error handling
//! - [`prelude`] - Convenient re-exports of commonly used types
//!
//! # Usage Examples
//!
//! ## Quick Start
//!
//! Add `bytescope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! bytescope = "0.3"
//! ```
//!
//! ## Decoding a container header
//!
//! ```rust
//! use bytescope::prelude::*;
//!
//! let data = b"FORM\x00\x00\x00\x0cname\0payload";
//! let mut acc = Accessor::open_reading_memory(data, 0, None)?;
//! acc.set_endianness(Endianness::Big);
//!
//! let mut tag = [0u8; 4];
//! acc.read_bytes(&mut tag)?;
//! let body_size = acc.read::<u32>()? as usize;
//! let name = acc.read_c_string()?;
//!
//! assert_eq!(&tag, b"FORM");
//! assert_eq!(body_size, 12);
//! assert_eq!(name, b"name");
//! # Ok::<(), bytescope::Error>(())
//! ```
//!
//! ## Producing a binary file
//!
//! ```rust,no_run
//! use bytescope::prelude::*;
//!
//! let mut out = Accessor::open_writing_file("", "out.bin", PathOptions::empty(), 0, 0)?;
//! out.set_endianness(Endianness::Little);
//! out.write::<u32>(0x46464952)?;
//! out.write_varint(123456)?;
//! out.close()?; // flushes the buffer to out.bin
//! # Ok::<(), bytescope::Error>(())
//! ```
//!
//! ## Mapping consumed regions
//!
//! ```rust
//! use bytescope::prelude::*;
//!
//! let data = [0u8; 256];
//! let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
//! acc.allow_coverage(true);
//! acc.set_coverage_usage(1, 0); // tag reads as "header"
//!
//! acc.read::<u64>()?;
//! acc.read::<u64>()?;
//! acc.summarize_coverage();
//!
//! assert_eq!(acc.coverage_records().len(), 1); // adjacent reads merged
//! # Ok::<(), bytescope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Accessors perform no internal synchronisation and are not `Send`: one accessor is
//! used by one flow of execution at a time. Accessors that do not share a base may be
//! used concurrently. The process-wide default endianness is the only global state.

#[macro_use]
mod error;

mod accessor;
mod endian;
mod path;
mod swap;

pub mod prelude;

pub use accessor::{Accessor, CoverageForce, CoverageRecord, Scalar};
pub use endian::{default_endianness, set_default_endianness, Endianness};
pub use error::Error;
pub use path::{build_path, create_directory, PathOptions};
pub use swap::{swap_i24, swap_int, swap_u16, swap_u24, swap_u32, swap_u64, swap_uint};

/// Result type used by all fallible operations of this library.
pub type Result<T> = std::result::Result<T, Error>;
