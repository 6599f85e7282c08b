// Duration math - Dots, tuplet scaling, rest filling and time signature changes
// All durations are whole-note fractions

use super::model::{Measure, NoteValue, RhythmElement, RhythmNote, TimeSignature, TupletRatio};

/// Tolerance for comparing summed durations
pub const EPSILON: f64 = 1e-6;

/// Most notes or rests a single generated measure may hold
pub const MAX_GENERATED_ELEMENTS: usize = 4096;

/// Errors from duration arithmetic
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DurationError {
    #[error("Invalid time signature {0}")]
    InvalidTimeSignature(TimeSignature),

    #[error("Rest denominator {0} is not a supported power of two")]
    InvalidDenominator(u32),

    #[error("Cannot fill a negative duration ({0})")]
    NegativeRemainder(f64),

    #[error("Remaining duration {remaining} cannot be filled with power-of-two rests")]
    Unrepresentable { remaining: f64 },

    #[error("Measure would need more than {limit} generated elements")]
    TooManyElements { limit: usize },

    #[error("Unsupported time signature change from {from} to {to}")]
    UnsupportedTimeSignatureChange { from: TimeSignature, to: TimeSignature },
}

/// Dot multiplier: `1 + Σ 2^-i` for `i` in `1..=dots`
pub fn dot_modifier(dots: u8) -> f64 {
    (1..=dots as i32).map(|i| 0.5f64.powi(i)).sum::<f64>() + 1.0
}

/// Tuplet multiplier `implied / played` (3:2 triplet = 2/3)
pub fn tuplet_modifier(ratio: TupletRatio) -> f64 {
    if ratio.played == 0 {
        return 0.0;
    }
    ratio.implied as f64 / ratio.played as f64
}

/// Effective duration of a note given its base value, dots and enclosing tuplet
pub fn effective_duration(raw_duration: f64, dots: u8, ratio: Option<TupletRatio>) -> f64 {
    let scale = ratio.map(tuplet_modifier).unwrap_or(1.0);
    raw_duration * dot_modifier(dots) * scale
}

/// Greedily fill `remaining` with the largest power-of-two rests that fit
///
/// Starts at `1 / start_denominator` and halves down to 1/1024. Failing to
/// close the gap at that resolution is an error, never an approximation.
pub fn fill_with_rests(
    remaining: f64,
    start_denominator: u32,
) -> Result<Vec<RhythmNote>, DurationError> {
    if remaining < -EPSILON {
        return Err(DurationError::NegativeRemainder(remaining));
    }
    if !start_denominator.is_power_of_two() || start_denominator > NoteValue::MAX_DENOMINATOR {
        return Err(DurationError::InvalidDenominator(start_denominator));
    }

    let mut rests = Vec::new();
    let mut remaining = remaining;
    let mut denominator = start_denominator;

    while remaining > EPSILON {
        let Some(value) = NoteValue::from_denominator(denominator) else {
            return Err(DurationError::Unrepresentable { remaining });
        };

        if value.duration() <= remaining + EPSILON {
            if rests.len() == MAX_GENERATED_ELEMENTS {
                return Err(DurationError::TooManyElements {
                    limit: MAX_GENERATED_ELEMENTS,
                });
            }
            rests.push(RhythmNote::rest(value));
            remaining -= value.duration();
        } else {
            denominator *= 2;
        }
    }

    Ok(rests)
}

/// Re-fit a measure's content to a new time signature
///
/// Longer measures get filler rests appended. Shorter ones keep the leading
/// elements that still fit and fill the gap with rests. An exact fit leaves
/// the elements untouched.
pub fn change_time_signature(
    measure: &Measure,
    time_signature: TimeSignature,
) -> Result<Measure, DurationError> {
    if !time_signature.is_valid() {
        return Err(DurationError::InvalidTimeSignature(time_signature));
    }

    let target = time_signature.measure_length();
    let content = measure.content_length();

    if (target - content).abs() < EPSILON {
        return Ok(Measure::new(time_signature, measure.elements.clone()));
    }

    let unsupported = |e: DurationError| match e {
        DurationError::TooManyElements { .. } => e,
        _ => DurationError::UnsupportedTimeSignatureChange {
            from: measure.time_signature,
            to: time_signature,
        },
    };

    let mut elements: Vec<RhythmElement> = Vec::with_capacity(measure.elements.len());
    let mut filled = 0.0;

    if target > content {
        elements.extend(measure.elements.iter().cloned());
        filled = content;
    } else {
        for element in &measure.elements {
            let duration = element.duration();
            if filled + duration > target + EPSILON {
                break;
            }
            filled += duration;
            elements.push(element.clone());
        }
    }

    let rests = fill_with_rests((target - filled).max(0.0), 1).map_err(unsupported)?;
    elements.extend(rests.into_iter().map(RhythmElement::Note));

    Ok(Measure::new(time_signature, elements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::model::{NoteKind, RhythmTuplet};
    use approx::assert_relative_eq;

    fn quarters(count: usize) -> Vec<RhythmElement> {
        (0..count)
            .map(|_| RhythmNote::note(NoteValue::Quarter).into())
            .collect()
    }

    #[test]
    fn test_dot_modifier() {
        assert_relative_eq!(dot_modifier(0), 1.0);
        assert_relative_eq!(dot_modifier(1), 1.5);
        assert_relative_eq!(dot_modifier(2), 1.75);
        assert_relative_eq!(dot_modifier(3), 1.875);
    }

    #[test]
    fn test_effective_duration() {
        assert_relative_eq!(effective_duration(1.0, 2, None), 1.75);
        assert_relative_eq!(
            effective_duration(1.0, 0, Some(TupletRatio::triplet())),
            0.6667,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            effective_duration(0.25, 1, Some(TupletRatio::new(5, 4))),
            0.3,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_fill_with_rests_greedy() {
        let rests = fill_with_rests(0.75, 1).unwrap();
        let values: Vec<_> = rests.iter().map(|r| r.value().unwrap()).collect();
        assert_eq!(values, vec![NoteValue::Half, NoteValue::Quarter]);
        assert!(rests.iter().all(|r| r.kind == NoteKind::Rest));
    }

    #[test]
    fn test_fill_with_rests_start_denominator() {
        // Starting at eighths never produces anything longer than an eighth
        let rests = fill_with_rests(0.375, 8).unwrap();
        assert_eq!(rests.len(), 3);
        assert!(rests.iter().all(|r| r.value() == Some(NoteValue::Eighth)));
    }

    #[test]
    fn test_fill_with_rests_zero() {
        assert!(fill_with_rests(0.0, 1).unwrap().is_empty());
        assert!(fill_with_rests(1e-9, 1).unwrap().is_empty());
    }

    #[test]
    fn test_fill_with_rests_unrepresentable() {
        let result = fill_with_rests(1.0 / 3.0, 1);
        assert!(matches!(result, Err(DurationError::Unrepresentable { .. })));
    }

    #[test]
    fn test_fill_with_rests_is_bounded() {
        let limit = MAX_GENERATED_ELEMENTS;
        assert_eq!(fill_with_rests(limit as f64, 1).unwrap().len(), limit);
        assert_eq!(
            fill_with_rests(4_000_000_000.0, 1),
            Err(DurationError::TooManyElements { limit })
        );
    }

    #[test]
    fn test_change_to_huge_time_signature_fails() {
        let measure = Measure::new(TimeSignature::four_four(), quarters(4));
        assert_eq!(
            change_time_signature(&measure, TimeSignature::new(4_000_000_000, 1)),
            Err(DurationError::TooManyElements {
                limit: MAX_GENERATED_ELEMENTS
            })
        );
    }

    #[test]
    fn test_fill_with_rests_bad_input() {
        assert!(matches!(
            fill_with_rests(-0.5, 1),
            Err(DurationError::NegativeRemainder(_))
        ));
        assert_eq!(
            fill_with_rests(0.5, 3),
            Err(DurationError::InvalidDenominator(3))
        );
    }

    #[test]
    fn test_change_time_signature_grow() {
        let measure = Measure::new(TimeSignature::three_four(), quarters(3));
        let changed = change_time_signature(&measure, TimeSignature::four_four()).unwrap();

        assert_eq!(changed.time_signature, TimeSignature::four_four());
        assert_eq!(changed.elements.len(), 4);
        assert_relative_eq!(changed.content_length(), 1.0);
        assert_eq!(
            changed.elements[3],
            RhythmElement::Note(RhythmNote::rest(NoteValue::Quarter))
        );
    }

    #[test]
    fn test_change_time_signature_shrink() {
        let mut elements = quarters(2);
        elements.push(RhythmNote::note(NoteValue::Half).into());
        let measure = Measure::new(TimeSignature::four_four(), elements);

        // The half note no longer fits in 5/8: two quarters + an eighth rest
        let changed = change_time_signature(&measure, TimeSignature::new(5, 8)).unwrap();
        assert_eq!(changed.elements.len(), 3);
        assert_eq!(
            changed.elements[2],
            RhythmElement::Note(RhythmNote::rest(NoteValue::Eighth))
        );
        assert_relative_eq!(changed.content_length(), 0.625);
    }

    #[test]
    fn test_change_time_signature_exact_is_unchanged() {
        let measure = Measure::new(TimeSignature::four_four(), quarters(4));
        let changed = change_time_signature(&measure, TimeSignature::new(2, 2)).unwrap();
        assert_eq!(changed.elements, measure.elements);

        // Applying the same change twice is stable
        let again = change_time_signature(&changed, TimeSignature::new(2, 2)).unwrap();
        assert_eq!(again, changed);
    }

    #[test]
    fn test_change_time_signature_drops_tuplet_that_does_not_fit() {
        let triplet = RhythmTuplet::new(
            TupletRatio::triplet(),
            vec![RhythmNote::note(NoteValue::Quarter); 3],
        );
        let measure = Measure::new(
            TimeSignature::four_four(),
            vec![triplet.into(), RhythmNote::note(NoteValue::Half).into()],
        );

        // Triplet (1/2) is kept, the half note is replaced by a quarter rest
        let changed = change_time_signature(&measure, TimeSignature::three_four()).unwrap();
        assert_eq!(changed.elements.len(), 2);
        assert!(matches!(changed.elements[0], RhythmElement::Tuplet(_)));
        assert_relative_eq!(changed.content_length(), 0.75);
    }

    #[test]
    fn test_change_time_signature_unrepresentable_residual() {
        // A lone triplet quarter (1/6) leaves a residual no power-of-two rest can close
        let tuplet = RhythmTuplet::new(
            TupletRatio::triplet(),
            vec![RhythmNote::note(NoteValue::Quarter)],
        );
        let measure = Measure::new(TimeSignature::four_four(), vec![tuplet.into()]);
        let result = change_time_signature(&measure, TimeSignature::three_four());
        assert!(matches!(
            result,
            Err(DurationError::UnsupportedTimeSignatureChange { .. })
        ));
    }

    #[test]
    fn test_change_time_signature_invalid_target() {
        let measure = Measure::new(TimeSignature::four_four(), quarters(4));
        assert_eq!(
            change_time_signature(&measure, TimeSignature::new(4, 6)),
            Err(DurationError::InvalidTimeSignature(TimeSignature::new(4, 6)))
        );
    }
}
