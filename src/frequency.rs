//! Raw and quote-aware character frequency profiles.

use std::collections::{BTreeMap, HashMap};

use log::debug;

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// Occurrence statistics for one character across the sampled lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharStatistic {
    pub ch: char,
    pub occurrences: usize,
    pub lines_present: usize,
    pub variance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CharProfile {
    occurrences: BTreeMap<char, usize>,
    lines_present: BTreeMap<char, usize>,
    per_line: Vec<HashMap<char, usize>>,
}

impl CharProfile {
    fn begin_line(&mut self) {
        self.per_line.push(HashMap::new());
    }

    fn record(&mut self, ch: char) {
        *self.occurrences.entry(ch).or_insert(0) += 1;
        if let Some(line) = self.per_line.last_mut() {
            let count = line.entry(ch).or_insert(0);
            if *count == 0 {
                *self.lines_present.entry(ch).or_insert(0) += 1;
            }
            *count += 1;
        }
    }

    pub fn line_count(&self) -> usize {
        self.per_line.len()
    }

    pub fn occurrences(&self, ch: char) -> usize {
        self.occurrences.get(&ch).copied().unwrap_or(0)
    }

    pub fn lines_present(&self, ch: char) -> usize {
        self.lines_present.get(&ch).copied().unwrap_or(0)
    }

    /// Population variance of the per-line frequency of `ch`, lines where it
    /// is missing counting as zero.
    pub fn variance(&self, ch: char) -> f64 {
        let lines = self.line_count();
        if lines == 0 {
            return 0.0;
        }
        let mean = self.occurrences(ch) as f64 / lines as f64;
        let sum: f64 = self
            .per_line
            .iter()
            .map(|line| {
                let delta = line.get(&ch).copied().unwrap_or(0) as f64 - mean;
                delta * delta
            })
            .sum();
        sum / lines as f64
    }

    /// Statistics for every observed character, ordered by code point.
    pub fn statistics(&self) -> Vec<CharStatistic> {
        self.occurrences
            .iter()
            .map(|(&ch, &occurrences)| CharStatistic {
                ch,
                occurrences,
                lines_present: self.lines_present(ch),
                variance: self.variance(ch),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrequencyProfile {
    pub raw: CharProfile,
    pub quote_aware: CharProfile,
    line_count: usize,
    big_spaces: BTreeMap<usize, usize>,
    word_starts: BTreeMap<usize, usize>,
}

impl FrequencyProfile {
    /// Profiles up to `max_lines` non-blank lines of `text`.
    pub fn scan(text: &str, max_lines: usize) -> Self {
        let mut profile = FrequencyProfile::default();
        let mut in_quotes = false;

        for line in text.lines().filter(|line| !line.trim().is_empty()).take(max_lines) {
            profile.line_count += 1;
            profile.raw.begin_line();
            profile.quote_aware.begin_line();

            let mut spaces = 0usize;
            let mut previous: Option<char> = None;
            for (idx, ch) in line.chars().enumerate() {
                profile.raw.record(ch);
                if ch == QUOTE && previous != Some(ESCAPE) {
                    in_quotes = !in_quotes;
                } else if !in_quotes {
                    profile.quote_aware.record(ch);
                }

                if ch == ' ' {
                    spaces += 1;
                    if spaces >= 2 {
                        *profile.big_spaces.entry(idx).or_insert(0) += 1;
                    }
                } else {
                    if spaces >= 2 {
                        *profile.word_starts.entry(idx).or_insert(0) += 1;
                    }
                    spaces = 0;
                }
                previous = Some(ch);
            }
        }

        debug!(
            "Profiled {} line(s): {} distinct character(s), {} outside quotes",
            profile.line_count,
            profile.raw.occurrences.len(),
            profile.quote_aware.occurrences.len()
        );
        profile
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Character indices that sit inside a run of two or more spaces on
    /// every sampled line, ascending.
    pub fn common_big_spaces(&self) -> Vec<usize> {
        Self::on_every_line(&self.big_spaces, self.line_count)
    }

    /// Number of sampled lines on which text resumes at `idx` right after a
    /// multi-space run.
    pub fn word_start_lines(&self, idx: usize) -> usize {
        self.word_starts.get(&idx).copied().unwrap_or(0)
    }

    fn on_every_line(counts: &BTreeMap<usize, usize>, line_count: usize) -> Vec<usize> {
        if line_count == 0 {
            return Vec::new();
        }
        counts
            .iter()
            .filter(|(_, count)| **count == line_count)
            .map(|(idx, _)| *idx)
            .collect()
    }
}
