//! Half-open interval arithmetic, grounded on the original implementation's
//! `common/util/interval.h`, adopted as the concrete operation set for
//! `LineNumberSet` (spec §4.8).

/// A half-open `[min, max)` integer interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct LineInterval {
    pub min: usize,
    pub max: usize,
}

impl LineInterval {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn empty(&self) -> bool {
        self.min == self.max
    }

    pub fn valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn length(&self) -> usize {
        self.max - self.min
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.min && value < self.max
    }

    pub fn intersects(&self, other: &LineInterval) -> bool {
        self.min < other.max && other.min < self.max
    }
}

impl From<(usize, usize)> for LineInterval {
    fn from((min, max): (usize, usize)) -> Self {
        Self { min, max }
    }
}

/// A finite set of 1-based line intervals selected for formatting (spec
/// §4.8). `None` means "format the whole file".
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(from = "Vec<LineInterval>")]
pub struct LineNumberSet {
    intervals: Vec<LineInterval>,
}

impl From<Vec<LineInterval>> for LineNumberSet {
    fn from(intervals: Vec<LineInterval>) -> Self {
        LineNumberSet::new(intervals)
    }
}

impl LineNumberSet {
    pub fn new(mut intervals: Vec<LineInterval>) -> Self {
        intervals.retain(|iv| iv.valid() && !iv.empty());
        Self { intervals }
    }

    pub fn intervals(&self) -> &[LineInterval] {
        &self.intervals
    }

    /// The set that selects every line (the default: format everything).
    pub fn everything() -> Self {
        Self {
            intervals: vec![LineInterval::new(0, usize::MAX)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains_line(&self, line: usize) -> bool {
        self.intervals.iter().any(|iv| iv.contains(line))
    }

    pub fn intersects(&self, range: &LineInterval) -> bool {
        self.intervals.iter().any(|iv| iv.intersects(range))
    }
}

/// Maps a byte offset into a source buffer to its 1-based line number.
/// Built once per `format_range` call (spec §4.8) so the range-selection
/// driver can translate a partition's token byte offsets into the line
/// numbers a caller's [`LineNumberSet`] is expressed in.
pub struct LineIndex {
    newline_offsets: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let newline_offsets = source
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self { newline_offsets }
    }

    /// 1-based line number containing byte offset `pos`.
    pub fn line_at(&self, pos: usize) -> usize {
        self.newline_offsets.partition_point(|&n| n < pos) + 1
    }
}
