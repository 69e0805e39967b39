// src/core/diff.rs
//! Line-oriented unified diff.
//!
//! Lines keep their terminators so that a diff applied to the old text gives back the
//! new text byte for byte, including a missing final newline.
use std::fmt;
use similar::{Algorithm, ChangeTag, DiffOp, DiffableStr, TextDiff};

use crate::error::{PageWatchError, PageWatchResult};

/// One line of a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    /// Line text including its terminator, if it had one
    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(text) | DiffLine::Removed(text) | DiffLine::Added(text) => text,
        }
    }

    fn marker(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }
}

/// A contiguous region of change. Starts are 0-based line positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

/// Difference between two texts, grouped into hunks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnifiedDiff {
    hunks: Vec<Hunk>,
}

/// Split text into lines the way the diff does, keeping each line's terminator
pub fn split_lines(text: &str) -> Vec<&str> {
    text.tokenize_lines()
}

impl UnifiedDiff {
    /// Compute the diff from `old` to `new` with `context` unchanged lines around each change.
    ///
    /// Hunks closer than twice the context are merged, as `diff -u` does.
    pub fn between(old: &str, new: &str, context: usize) -> Self {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_lines(old, new);

        Self {
            hunks: diff
                .grouped_ops(context)
                .iter()
                .filter_map(|ops| to_hunk(&diff, ops))
                .collect(),
        }
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Number of added and removed lines
    pub fn line_counts(&self) -> (usize, usize) {
        self.hunks
            .iter()
            .flat_map(|hunk| hunk.lines.iter())
            .fold((0, 0), |(added, removed), line| match line {
                DiffLine::Added(_) => (added + 1, removed),
                DiffLine::Removed(_) => (added, removed + 1),
                DiffLine::Context(_) => (added, removed),
            })
    }

    /// Apply the diff to `old`, producing the new text
    pub fn apply(&self, old: &str) -> PageWatchResult<String> {
        let lines = split_lines(old);
        let mut out = String::with_capacity(old.len());
        let mut cursor = 0;

        for hunk in &self.hunks {
            if hunk.old_start < cursor || hunk.old_start > lines.len() {
                return Err(PageWatchError::PatchMismatch { line: hunk.old_start + 1 });
            }
            lines[cursor..hunk.old_start].iter().for_each(|line| out.push_str(line));
            cursor = hunk.old_start;

            for line in &hunk.lines {
                match line {
                    DiffLine::Context(text) | DiffLine::Removed(text) => {
                        if lines.get(cursor) != Some(&text.as_str()) {
                            return Err(PageWatchError::PatchMismatch { line: cursor + 1 });
                        }
                        if let DiffLine::Context(_) = line {
                            out.push_str(text);
                        }
                        cursor += 1;
                    }
                    DiffLine::Added(text) => out.push_str(text),
                }
            }
        }

        lines[cursor..].iter().for_each(|line| out.push_str(line));
        Ok(out)
    }
}

impl fmt::Display for UnifiedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hunks.is_empty() {
            return Ok(());
        }

        writeln!(f, "--- Before")?;
        writeln!(f, "+++ After")?;
        for hunk in &self.hunks {
            writeln!(
                f,
                "@@ -{} +{} @@",
                hunk_range(hunk.old_start, hunk.old_len),
                hunk_range(hunk.new_start, hunk.new_len)
            )?;
            for line in &hunk.lines {
                let text = line.text();
                if text.ends_with('\n') {
                    write!(f, "{}{}", line.marker(), text)?;
                } else {
                    writeln!(f, "{}{}", line.marker(), text)?;
                    writeln!(f, "\\ No newline at end of file")?;
                }
            }
        }
        Ok(())
    }
}

fn hunk_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

fn to_hunk(diff: &TextDiff<'_, '_, '_, str>, ops: &[DiffOp]) -> Option<Hunk> {
    let first = ops.first()?;
    let mut hunk = Hunk {
        old_start: first.old_range().start,
        old_len: 0,
        new_start: first.new_range().start,
        new_len: 0,
        lines: Vec::new(),
    };

    for op in ops {
        hunk.old_len += op.old_range().len();
        hunk.new_len += op.new_range().len();
        hunk.lines.extend(diff.iter_changes(op).map(|change| {
            let text = change.value().to_string();
            match change.tag() {
                ChangeTag::Equal => DiffLine::Context(text),
                ChangeTag::Delete => DiffLine::Removed(text),
                ChangeTag::Insert => DiffLine::Added(text),
            }
        }));
    }

    Some(hunk)
}
