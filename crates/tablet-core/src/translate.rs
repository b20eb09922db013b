//! Sample-to-event translation.
//!
//! [`translate`] is the whole per-sample policy of the bridge:
//!
//! 1. **Tool out of range** – emit `pressure = 0`, `touch = false`, `sync`.
//!    Position is never sent in this case.  Downstream consumers must see the
//!    pen lift whenever the tool leaves range, whatever the stale position.
//! 2. **Tool in range** – emit `x`, `y`, `pressure` (raw values, unchanged),
//!    `touch = pressure > threshold`, `sync`, in exactly that order so that
//!    consumers relying on axis-before-button ordering see a coherent frame.
//! 3. **Absent fields** – a `None` field produces no event.  The touch event
//!    is derived from pressure, so it is suppressed along with it.  The sync
//!    marker is always emitted.
//!
//! Values are not range-checked; that is the sample source's job.

use crate::domain::sample::Sample;
use crate::domain::threshold::PressureThreshold;
use crate::event::{Axis, Burst, SyntheticEvent};

/// Translates one sample into its ordered burst of synthetic events.
pub fn translate(sample: &Sample, threshold: PressureThreshold) -> Burst {
    let mut burst = Burst::new();

    if !sample.proximity {
        burst.push(SyntheticEvent::Abs { axis: Axis::Pressure, value: 0 });
        burst.push(SyntheticEvent::Touch(false));
        burst.push(SyntheticEvent::Sync);
        return burst;
    }

    if let Some(x) = sample.x {
        burst.push(SyntheticEvent::Abs { axis: Axis::X, value: x });
    }
    if let Some(y) = sample.y {
        burst.push(SyntheticEvent::Abs { axis: Axis::Y, value: y });
    }
    if let Some(pressure) = sample.pressure {
        burst.push(SyntheticEvent::Abs { axis: Axis::Pressure, value: pressure });
        burst.push(SyntheticEvent::Touch(threshold.is_touch(pressure)));
    }
    burst.push(SyntheticEvent::Sync);
    burst
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(v: i32) -> PressureThreshold {
        PressureThreshold::new(v).unwrap()
    }

    #[test]
    fn test_in_range_sample_emits_full_frame_in_order() {
        // Arrange
        let sample = Sample::in_range(100, 200, 50);

        // Act
        let burst = translate(&sample, threshold(40));

        // Assert
        assert_eq!(
            burst.events(),
            &[
                SyntheticEvent::Abs { axis: Axis::X, value: 100 },
                SyntheticEvent::Abs { axis: Axis::Y, value: 200 },
                SyntheticEvent::Abs { axis: Axis::Pressure, value: 50 },
                SyntheticEvent::Touch(true),
                SyntheticEvent::Sync,
            ]
        );
    }

    #[test]
    fn test_out_of_range_sample_emits_lift_only() {
        let burst = translate(&Sample::out_of_range(), threshold(40));

        assert_eq!(
            burst.events(),
            &[
                SyntheticEvent::Abs { axis: Axis::Pressure, value: 0 },
                SyntheticEvent::Touch(false),
                SyntheticEvent::Sync,
            ]
        );
    }

    #[test]
    fn test_out_of_range_ignores_stale_position_and_pressure() {
        // Arrange – fields are populated but the tool is not in range
        let sample = Sample {
            proximity: false,
            ..Sample::in_range(5000, 6000, 900)
        };

        // Act
        let burst = translate(&sample, threshold(40));

        // Assert – identical to a bare out-of-range sample
        assert_eq!(burst, translate(&Sample::out_of_range(), threshold(40)));
    }

    #[test]
    fn test_pressure_equal_to_threshold_is_not_touch() {
        let burst = translate(&Sample::in_range(0, 0, 40), threshold(40));
        assert!(burst.events().contains(&SyntheticEvent::Touch(false)));
    }

    #[test]
    fn test_pressure_one_above_threshold_is_touch() {
        let burst = translate(&Sample::in_range(0, 0, 41), threshold(40));
        assert!(burst.events().contains(&SyntheticEvent::Touch(true)));
    }

    #[test]
    fn test_absent_position_field_is_suppressed() {
        // Arrange
        let sample = Sample {
            x: None,
            ..Sample::in_range(1, 2, 3)
        };

        // Act
        let burst = translate(&sample, threshold(40));

        // Assert
        assert_eq!(
            burst.events(),
            &[
                SyntheticEvent::Abs { axis: Axis::Y, value: 2 },
                SyntheticEvent::Abs { axis: Axis::Pressure, value: 3 },
                SyntheticEvent::Touch(false),
                SyntheticEvent::Sync,
            ]
        );
    }

    #[test]
    fn test_absent_pressure_suppresses_touch_too() {
        let sample = Sample {
            pressure: None,
            ..Sample::in_range(10, 20, 999)
        };

        let burst = translate(&sample, threshold(40));

        assert_eq!(
            burst.events(),
            &[
                SyntheticEvent::Abs { axis: Axis::X, value: 10 },
                SyntheticEvent::Abs { axis: Axis::Y, value: 20 },
                SyntheticEvent::Sync,
            ]
        );
    }

    #[test]
    fn test_all_fields_absent_still_emits_sync() {
        let sample = Sample {
            proximity: true,
            ..Sample::default()
        };

        let burst = translate(&sample, threshold(40));

        assert_eq!(burst.events(), &[SyntheticEvent::Sync]);
    }

    #[test]
    fn test_negative_values_pass_through_unchanged() {
        let burst = translate(&Sample::in_range(-7, -8, -9), threshold(1));

        assert_eq!(burst.events()[0], SyntheticEvent::Abs { axis: Axis::X, value: -7 });
        assert_eq!(burst.events()[1], SyntheticEvent::Abs { axis: Axis::Y, value: -8 });
        assert_eq!(burst.events()[2], SyntheticEvent::Abs { axis: Axis::Pressure, value: -9 });
        assert_eq!(burst.events()[3], SyntheticEvent::Touch(false));
    }

    #[test]
    fn test_every_burst_ends_with_exactly_one_sync() {
        let samples = [
            Sample::in_range(1, 1, 1),
            Sample::out_of_range(),
            Sample { proximity: true, ..Sample::default() },
            Sample { y: None, ..Sample::in_range(1, 1, 100) },
        ];

        for sample in &samples {
            let burst = translate(sample, threshold(20));
            let syncs = (&burst).into_iter().filter(|e| **e == SyntheticEvent::Sync).count();
            assert_eq!(syncs, 1, "sample {sample:?}");
            assert_eq!(burst.events().last(), Some(&SyntheticEvent::Sync));
        }
    }
}
