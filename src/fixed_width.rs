use itertools::Itertools;
use log::debug;

use crate::{dialect::REST_OF_LINE, frequency::FrequencyProfile};

/// Fewest fields (the open-ended last one included) accepted as a layout.
pub const MIN_FIXED_WIDTH_FIELDS: usize = 3;

/// Infers field widths from space runs shared by every sampled line. The
/// last entry is [`REST_OF_LINE`].
pub fn detect_field_widths(profile: &FrequencyProfile) -> Option<Vec<i32>> {
    let cuts: Vec<usize> = profile
        .common_big_spaces()
        .into_iter()
        .map(|idx| (idx, idx))
        .coalesce(|(start, end), (next_start, next_end)| {
            if next_start == end + 1 {
                Ok((start, next_end))
            } else {
                Err(((start, end), (next_start, next_end)))
            }
        })
        .map(|(_, end)| end + 1)
        // trailing padding is not followed by text anywhere
        .filter(|cut| profile.word_start_lines(*cut) > 0)
        .collect();

    let mut widths = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0usize;
    for cut in cuts {
        widths.push((cut - start) as i32);
        start = cut;
    }
    widths.push(REST_OF_LINE);

    if widths.len() < MIN_FIXED_WIDTH_FIELDS {
        debug!(
            "Fixed-width layout rejected: {} field(s) found, {} required",
            widths.len(),
            MIN_FIXED_WIDTH_FIELDS
        );
        return None;
    }
    debug!("Fixed-width layout detected: {widths:?}");
    Some(widths)
}
