use std::cmp::Ordering;

use crate::frequency::CharStatistic;

/// Uncertainty reported when no tier matched; lower means more confident.
pub const EXHAUSTED: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatorGuess {
    pub separator: Option<char>,
    pub uncertainty: u8,
}

impl SeparatorGuess {
    fn found(separator: char, uncertainty: u8) -> Self {
        Self {
            separator: Some(separator),
            uncertainty,
        }
    }

    fn exhausted() -> Self {
        Self {
            separator: None,
            uncertainty: EXHAUSTED,
        }
    }
}

struct Scorer<'a> {
    stats: &'a [CharStatistic],
    line_count: usize,
    preferred: &'a [char],
}

impl Scorer<'_> {
    fn preference(&self, ch: char) -> usize {
        self.preferred
            .iter()
            .position(|candidate| *candidate == ch)
            .unwrap_or(usize::MAX)
    }

    fn is_preferred(&self, ch: char) -> bool {
        self.preferred.contains(&ch)
    }

    /// Most frequent zero-variance character satisfying `filter`.
    fn most_frequent_constant<F>(&self, filter: F) -> Option<char>
    where
        F: Fn(&CharStatistic) -> bool,
    {
        self.stats
            .iter()
            .filter(|stat| stat.variance == 0.0 && filter(stat))
            .min_by(|a, b| {
                b.occurrences
                    .cmp(&a.occurrences)
                    .then_with(|| self.preference(a.ch).cmp(&self.preference(b.ch)))
                    .then_with(|| a.ch.cmp(&b.ch))
            })
            .map(|stat| stat.ch)
    }

    /// Characters present on every line, lowest variance first.
    fn ranked_on_every_line(&self) -> Vec<&CharStatistic> {
        let mut ranked: Vec<&CharStatistic> = self
            .stats
            .iter()
            .filter(|stat| self.line_count > 0 && stat.lines_present == self.line_count)
            .collect();
        ranked.sort_by(|a, b| {
            a.variance
                .total_cmp(&b.variance)
                .then_with(|| b.occurrences.cmp(&a.occurrences))
                .then_with(|| self.preference(a.ch).cmp(&self.preference(b.ch)))
                .then_with(|| a.ch.cmp(&b.ch))
        });
        ranked
    }
}

/// Picks the most plausible separator.
///
/// Tiers, in order:
/// 0. a preferred, zero-variance character averaging at least one per line;
/// 1. the lowest-variance character present on every line, if preferred;
/// 2. the runner-up of tier 1, if preferred;
/// 3. any zero-variance character averaging at least two per line.
pub fn choose_separator(
    stats: &[CharStatistic],
    line_count: usize,
    preferred: &[char],
) -> SeparatorGuess {
    if line_count == 0 {
        return SeparatorGuess::exhausted();
    }
    let scorer = Scorer {
        stats,
        line_count,
        preferred,
    };

    if let Some(ch) = scorer.most_frequent_constant(|stat| {
        scorer.is_preferred(stat.ch) && stat.occurrences >= line_count
    }) {
        return SeparatorGuess::found(ch, 0);
    }

    let ranked = scorer.ranked_on_every_line();
    for (tier, candidate) in ranked.iter().take(2).enumerate() {
        if scorer.is_preferred(candidate.ch) {
            return SeparatorGuess::found(candidate.ch, tier as u8 + 1);
        }
    }

    if let Some(ch) = scorer.most_frequent_constant(|stat| stat.occurrences >= line_count * 2) {
        return SeparatorGuess::found(ch, 3);
    }

    SeparatorGuess::exhausted()
}

/// Ordering of guesses: lower uncertainty is better.
pub fn compare(left: &SeparatorGuess, right: &SeparatorGuess) -> Ordering {
    left.uncertainty.cmp(&right.uncertainty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(ch: char, occurrences: usize, lines_present: usize, variance: f64) -> CharStatistic {
        CharStatistic {
            ch,
            occurrences,
            lines_present,
            variance,
        }
    }

    const PREFERRED: [char; 4] = [',', ';', '|', '\t'];

    #[test]
    fn tier_zero_prefers_most_frequent_constant_separator() {
        let stats = vec![
            stat(',', 10, 5, 0.0),
            stat(';', 5, 5, 0.0),
            stat('a', 20, 5, 0.0),
        ];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess, SeparatorGuess::found(',', 0));
    }

    #[test]
    fn tier_one_accepts_lowest_variance_preferred() {
        let stats = vec![
            stat(',', 12, 5, 0.4),
            stat('x', 9, 5, 1.2),
            stat('y', 3, 2, 0.1),
        ];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess, SeparatorGuess::found(',', 1));
    }

    #[test]
    fn tier_two_accepts_runner_up() {
        let stats = vec![
            stat('e', 15, 5, 0.2),
            stat(';', 14, 5, 0.3),
            stat('t', 8, 5, 0.9),
        ];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess, SeparatorGuess::found(';', 2));
    }

    #[test]
    fn tier_three_ignores_preference() {
        let stats = vec![stat('#', 10, 5, 0.0), stat('x', 4, 4, 0.0)];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess, SeparatorGuess::found('#', 3));
    }

    #[test]
    fn exhausted_when_nothing_fits() {
        let stats = vec![stat('a', 3, 2, 0.5), stat('b', 1, 1, 0.2)];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess, SeparatorGuess::exhausted());
        assert_eq!(choose_separator(&[], 0, &PREFERRED).uncertainty, EXHAUSTED);
    }

    #[test]
    fn ties_resolve_by_preference_order() {
        let stats = vec![stat(';', 5, 5, 0.0), stat(',', 5, 5, 0.0)];
        let guess = choose_separator(&stats, 5, &PREFERRED);
        assert_eq!(guess.separator, Some(','));
    }

    #[test]
    fn compare_orders_by_uncertainty() {
        let sure = SeparatorGuess::found(',', 0);
        let unsure = SeparatorGuess::found(';', 2);
        assert_eq!(compare(&sure, &unsure), Ordering::Less);
    }
}
