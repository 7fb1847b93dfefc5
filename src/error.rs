use thiserror::Error;

macro_rules! invalid_data_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidData($msg.to_string())
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidData(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every fallible operation reports its most probable cause of failure through one of these
/// variants. On failure the accessor that the operation was invoked on is left unchanged:
/// cursor, window size, coverage log and cursor stack all keep their pre-call values.
///
/// # Error Categories
///
/// ## Request Errors
/// - [`Error::InvalidParameter`] - A pre-condition on the arguments was violated
/// - [`Error::BeyondEnd`] - Access past the end of the accessor's window
/// - [`Error::ReadOnly`] - Write operation attempted on a read-only accessor
///
/// ## Data Errors
/// - [`Error::InvalidData`] - Malformed content encountered while decoding
///
/// ## Resource and I/O Errors
/// - [`Error::OutOfMemory`] - Buffer allocation failed
/// - [`Error::Open`] - A file could not be opened
/// - [`Error::Host`] - An underlying operating system call failed
/// - [`Error::Write`] - Output could not be written in full
///
/// # Examples
///
/// ```rust
/// use bytescope::{Accessor, Error};
///
/// let data = [0x01, 0x02];
/// let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
///
/// match acc.read::<u32>() {
///     Ok(value) => println!("read {value}"),
///     Err(Error::BeyondEnd) => println!("window too small for a u32"),
///     Err(e) => println!("other error: {e}"),
/// }
/// # Ok::<(), bytescope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter violated a documented pre-condition.
    ///
    /// Examples: an integer width above 8 bytes, popping an empty cursor
    /// stack, a Pascal string payload longer than 255 bytes, an empty
    /// delimiter, or a sub-accessor requested from a write-enabled accessor.
    #[error("Invalid parameter - {0}")]
    InvalidParameter(&'static str),

    /// An access past the end of the window was attempted.
    ///
    /// Raised by reads and seeks that would leave the accessor's window,
    /// by delimiter searches that exhaust their limit, and by open routines
    /// whose requested window does not fit the underlying data.
    #[error("Attempted to access data beyond the end of the window")]
    BeyondEnd,

    /// A buffer allocation failed.
    #[error("Memory allocation failed")]
    OutOfMemory,

    /// An underlying operating system call failed.
    ///
    /// Wraps read/seek/mmap/mkdir failures that are neither open nor write
    /// errors.
    #[error("{0}")]
    Host(std::io::Error),

    /// A file could not be opened.
    #[error("Could not open file - {0}")]
    Open(std::io::Error),

    /// Malformed content was encountered while decoding.
    ///
    /// For example a varint whose continuation bit is still set after the
    /// maximum number of groups for the accumulator width.
    #[error("Invalid data - {0}")]
    InvalidData(String),

    /// Output could not be written in full.
    ///
    /// Raised when flushing a write accessor to its output file fails or
    /// writes fewer bytes than requested.
    #[error("Could not write output - {0}")]
    Write(std::io::Error),

    /// A write operation was attempted on a read-only accessor.
    ///
    /// Sub-accessors are always read-only, and a swap with a read-only
    /// accessor demotes a write-enabled one.
    #[error("Write operation attempted on a read-only accessor")]
    ReadOnly,
}
