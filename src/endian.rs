//! Byte order tags and the process-wide default endianness.
//!
//! Binary container formats fix their byte order either absolutely (big or
//! little) or relative to the producing machine. The [`Endianness`] enum
//! carries all four spellings; the two relative tags resolve lazily against
//! the host so that values written as [`Endianness::Native`] on one machine
//! read back identically on the same machine regardless of architecture.
//!
//! Newly created accessors pick up the process-wide default returned by
//! [`default_endianness`], which starts as [`Endianness::Native`] and can be
//! changed with [`set_default_endianness`].

use std::sync::{
    atomic::{AtomicU8, Ordering},
    OnceLock,
};

/// Byte order of multi-byte values read or written by an accessor.
///
/// `Big` and `Little` are absolute. `Native` is whichever of the two the
/// running program uses, `Reverse` is its opposite; both are resolved
/// against the host exactly once, by probing the in-memory layout of a
/// known 64-bit constant.
///
/// # Examples
///
/// ```rust
/// use bytescope::Endianness;
///
/// let native = Endianness::native();
/// assert!(matches!(native, Endianness::Big | Endianness::Little));
/// assert_eq!(native.opposite(), Endianness::Reverse.big_or_little());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
    /// The byte order of the running program.
    Native,
    /// The opposite of the running program's byte order.
    Reverse,
}

/// Probe value whose first in-memory byte reveals the host byte order.
const ENDIANNESS_PROBE: u64 = 0x0102_0304_0506_0708;

impl Endianness {
    /// Returns the host byte order as either [`Endianness::Big`] or
    /// [`Endianness::Little`].
    ///
    /// For programs running under emulation (e.g. Rosetta) this is the byte
    /// order of the emulated code.
    pub fn native() -> Endianness {
        static NATIVE: OnceLock<Endianness> = OnceLock::new();

        *NATIVE.get_or_init(|| {
            if ENDIANNESS_PROBE.to_ne_bytes()[0] == 0x01 {
                Endianness::Big
            } else {
                Endianness::Little
            }
        })
    }

    /// Collapses this tag to [`Endianness::Big`] or [`Endianness::Little`].
    #[must_use]
    pub fn big_or_little(self) -> Endianness {
        match self {
            Endianness::Big | Endianness::Little => self,
            Endianness::Native => Endianness::native(),
            Endianness::Reverse => Endianness::native().opposite(),
        }
    }

    /// Collapses this tag to [`Endianness::Native`] or [`Endianness::Reverse`].
    #[must_use]
    pub fn native_or_reverse(self) -> Endianness {
        match self {
            Endianness::Native | Endianness::Reverse => self,
            e if e == Endianness::native() => Endianness::Native,
            _ => Endianness::Reverse,
        }
    }

    /// Big <-> Little and Native <-> Reverse conversion.
    #[must_use]
    pub fn opposite(self) -> Endianness {
        match self {
            Endianness::Big => Endianness::Little,
            Endianness::Little => Endianness::Big,
            Endianness::Native => Endianness::Reverse,
            Endianness::Reverse => Endianness::Native,
        }
    }

    /// Returns `true` if values under this tag are laid out most significant
    /// byte first.
    #[must_use]
    pub fn is_big(self) -> bool {
        self.big_or_little() == Endianness::Big
    }

    /// Returns `true` if values under this tag are laid out byte-reversed
    /// with respect to the host.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        self.native_or_reverse() == Endianness::Reverse
    }

    fn to_tag(self) -> u8 {
        match self {
            Endianness::Big => 0,
            Endianness::Little => 1,
            Endianness::Native => 2,
            Endianness::Reverse => 3,
        }
    }

    fn from_tag(tag: u8) -> Endianness {
        match tag {
            0 => Endianness::Big,
            1 => Endianness::Little,
            2 => Endianness::Native,
            _ => Endianness::Reverse,
        }
    }
}

static DEFAULT_ENDIANNESS: AtomicU8 = AtomicU8::new(2); // Endianness::Native

/// Returns the endianness that newly created accessors start with.
///
/// Initially [`Endianness::Native`]. The default is shared by the whole
/// process.
pub fn default_endianness() -> Endianness {
    Endianness::from_tag(DEFAULT_ENDIANNESS.load(Ordering::Relaxed))
}

/// Sets the endianness that newly created accessors start with.
///
/// The default is a single process-wide value; callers that mutate it while
/// concurrently creating accessors on other threads must provide their own
/// ordering.
pub fn set_default_endianness(e: Endianness) {
    DEFAULT_ENDIANNESS.store(e.to_tag(), Ordering::Relaxed);
}
