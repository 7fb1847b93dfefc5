//! Coverage recording: which parts of a window were consumed, and why.
//!
//! Reverse-engineering sessions rarely decode a container in one linear
//! pass. The coverage log keeps one [`CoverageRecord`] per successful read
//! so that, after parsing, the unexplored regions of a file can be found by
//! sorting and merging the log. Only read operations record coverage; write
//! operations never do.
//!
//! Recording can be toggled with [`Accessor::allow_coverage`] and paused
//! re-entrantly with [`Accessor::suspend_coverage`] /
//! [`Accessor::resume_coverage`] around reads whose coverage is handled by
//! the caller. [`Accessor::summarize_coverage`] condenses the log with the
//! default sort order and merge rule;
//! [`Accessor::summarize_coverage_with`] accepts replacements for both.
//!
//! # Examples
//!
//! ```rust
//! use bytescope::Accessor;
//!
//! let data = [0x10, 0x20, 0x30, 0x40];
//! let mut acc = Accessor::open_reading_memory(&data, 0, None)?;
//! acc.allow_coverage(true);
//!
//! acc.read::<u8>()?;
//! acc.read::<u8>()?;
//! acc.summarize_coverage();
//!
//! let records = acc.coverage_records();
//! assert_eq!(records.len(), 1);
//! assert_eq!((records[0].offset, records[0].size), (0, 2));
//! # Ok::<(), bytescope::Error>(())
//! ```

use std::cmp::Ordering;

use super::Accessor;

/// One consumed region of an accessor's window.
///
/// `offset` is relative to the accessor's own window. `usage1` and `usage2`
/// are free for the caller; no accessor routine interprets them. Implicit
/// records carry the values last given to
/// [`Accessor::set_coverage_usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRecord {
    /// Start of the region, relative to the accessor's window.
    pub offset: usize,
    /// Length of the region in bytes.
    pub size: usize,
    /// Caller-defined tag, typically a record-kind discriminant.
    pub usage1: u64,
    /// Caller-defined tag, typically a context pointer or index.
    pub usage2: usize,
}

impl CoverageRecord {
    fn end(&self) -> usize {
        self.offset + self.size
    }

    /// The default summarisation sort key: increasing offset, then
    /// decreasing size, then increasing `usage1`, then increasing `usage2`.
    #[must_use]
    pub fn default_compare(a: &CoverageRecord, b: &CoverageRecord) -> Ordering {
        a.offset
            .cmp(&b.offset)
            .then_with(|| b.size.cmp(&a.size))
            .then_with(|| a.usage1.cmp(&b.usage1))
            .then_with(|| a.usage2.cmp(&b.usage2))
    }

    /// The default merge rule: `a` absorbs `b` iff both usages match and
    /// the regions touch or overlap, with `a` sorted before `b`.
    ///
    /// Returns `true` if `b` was merged into `a`.
    pub fn default_merge(a: &mut CoverageRecord, b: &CoverageRecord) -> bool {
        if a.usage1 == b.usage1
            && a.usage2 == b.usage2
            && a.offset <= b.offset
            && b.offset <= a.end()
        {
            if b.end() > a.end() {
                a.size = b.end() - a.offset;
            }
            return true;
        }

        false
    }
}

/// Controls whether an explicit record overrides disabled coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageForce {
    /// Record only if coverage is enabled and not suspended.
    OnlyIfEnabled,
    /// Record even if coverage is disabled, unless it is suspended.
    EvenIfDisabled,
}

/// Per-accessor coverage state.
pub(super) struct Coverage {
    enabled: bool,
    suspend_count: u32,
    usage1: u64,
    usage2: usize,
    records: Vec<CoverageRecord>,
}

impl Coverage {
    pub(super) fn new() -> Coverage {
        Coverage {
            enabled: false,
            suspend_count: 0,
            usage1: 0,
            usage2: 0,
            records: Vec::new(),
        }
    }

    fn active(&self) -> bool {
        self.enabled && self.suspend_count == 0
    }

    /// Appends the implicit record for a successful read of `size` bytes at
    /// `offset`, if recording is active.
    ///
    /// The log must never silently lose records, so growth is infallible:
    /// an allocation failure aborts the process.
    pub(super) fn record_read(&mut self, offset: usize, size: usize) {
        if self.active() {
            self.records.push(CoverageRecord {
                offset,
                size,
                usage1: self.usage1,
                usage2: self.usage2,
            });
        }
    }
}

impl Accessor<'_> {
    /// Enables or disables coverage recording.
    ///
    /// All accessors start with coverage disabled, including sub-accessors
    /// of an accessor that records coverage.
    pub fn allow_coverage(&mut self, allow: bool) {
        self.coverage.enabled = allow;
    }

    /// Returns `true` if coverage recording is enabled.
    ///
    /// Suspension does not affect the reported value.
    #[must_use]
    pub fn is_coverage_allowed(&self) -> bool {
        self.coverage.enabled
    }

    /// Suspends coverage recording until a matching
    /// [`resume_coverage`](Accessor::resume_coverage).
    ///
    /// Suspension nests: recording resumes only when every suspend has been
    /// matched by a resume.
    pub fn suspend_coverage(&mut self) {
        self.coverage.suspend_count = self.coverage.suspend_count.saturating_add(1);
    }

    /// Undoes one [`suspend_coverage`](Accessor::suspend_coverage); never
    /// drops the count below zero.
    pub fn resume_coverage(&mut self) {
        self.coverage.suspend_count = self.coverage.suspend_count.saturating_sub(1);
    }

    /// Sets the `usage1` and `usage2` values attached to future implicit
    /// coverage records.
    pub fn set_coverage_usage(&mut self, usage1: u64, usage2: usize) {
        self.coverage.usage1 = usage1;
        self.coverage.usage2 = usage2;
    }

    /// Appends an explicit coverage record of `size` bytes at `offset` of
    /// this accessor's window.
    ///
    /// `size == None` means "up to end of window".
    /// [`CoverageForce::EvenIfDisabled`] overrides disabled (but not
    /// suspended) coverage. Records that do not fit the window are silently
    /// discarded.
    pub fn add_coverage_record(
        &mut self,
        offset: usize,
        size: Option<usize>,
        usage1: u64,
        usage2: usize,
        force: CoverageForce,
    ) {
        let recording = self.coverage.enabled || force == CoverageForce::EvenIfDisabled;
        if !recording || self.coverage.suspend_count > 0 {
            return;
        }

        // only add valid coverage records
        if offset > self.window_size {
            return;
        }
        let size = match size {
            Some(size) => size,
            None => self.window_size - offset,
        };
        match offset.checked_add(size) {
            Some(end) if end <= self.window_size => {}
            _ => return,
        }

        self.coverage.records.push(CoverageRecord {
            offset,
            size,
            usage1,
            usage2,
        });
    }

    /// Returns the coverage record array.
    ///
    /// The array is in recording order unless
    /// [`summarize_coverage`](Accessor::summarize_coverage) was called.
    #[must_use]
    pub fn coverage_records(&self) -> &[CoverageRecord] {
        &self.coverage.records
    }

    /// Sorts and merges the coverage records with the default comparator
    /// and merge rule.
    ///
    /// Coverage recording stays enabled or disabled as it was; summarising
    /// is idempotent.
    pub fn summarize_coverage(&mut self) {
        self.summarize_coverage_with(CoverageRecord::default_compare, CoverageRecord::default_merge);
    }

    /// Sorts and merges the coverage records with a caller-supplied
    /// comparator and merge rule.
    ///
    /// `compare` defines the sort order. `merge` is invoked on adjacent
    /// pairs `(a, b)` with `a` sorted before `b`; returning `true` means
    /// `b` was merged into `a` and is removed. Pairs are visited from the
    /// back of the array towards the front, which keeps removals cheap.
    pub fn summarize_coverage_with<C, M>(&mut self, mut compare: C, mut merge: M)
    where
        C: FnMut(&CoverageRecord, &CoverageRecord) -> Ordering,
        M: FnMut(&mut CoverageRecord, &CoverageRecord) -> bool,
    {
        let records = &mut self.coverage.records;
        if records.is_empty() {
            return;
        }

        records.sort_by(|a, b| compare(a, b));

        let mut i = records.len();
        while i > 1 {
            i -= 1;
            let (head, tail) = records.split_at_mut(i);
            if merge(&mut head[i - 1], &tail[0]) {
                records.remove(i);
            }
        }
    }
}
