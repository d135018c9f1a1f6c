use crate::core::ConfigurationError;

/// Segment reached only through the deadline fallback.
pub const IDLE_SEGMENT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub duration: f64, // seconds
    pub offset: f64,   // seconds from the start of the composite file
}

/// Immutable layout of the composite video, built once at startup.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    segments: Vec<Segment>,
}

impl SegmentTable {
    /// Lays the segments end to end. Every offset is pushed past its nominal
    /// start by `debounce_delay` so a seek never lands on the previous
    /// segment's last frame.
    pub fn build(durations: &[f64], debounce_delay: f64) -> Result<Self, ConfigurationError> {
        if durations.is_empty() {
            return Err(ConfigurationError::EmptyDurations);
        }
        if !debounce_delay.is_finite() || debounce_delay < 0.0 {
            return Err(ConfigurationError::InvalidConstant {
                name: "debounce_delay_secs",
                value: debounce_delay.to_string(),
            });
        }

        let mut segments = Vec::with_capacity(durations.len());
        let mut start = 0.0;
        for (index, &duration) in durations.iter().enumerate() {
            // Also rejects NaN
            if !(duration > 0.0) || !duration.is_finite() {
                return Err(ConfigurationError::NonPositiveDuration { index, duration });
            }
            segments.push(Segment {
                index,
                duration,
                offset: start + debounce_delay,
            });
            start += duration;
        }

        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn offset(&self, index: usize) -> Option<f64> {
        self.get(index).map(|s| s.offset)
    }

    pub fn duration(&self, index: usize) -> Option<f64> {
        self.get(index).map(|s| s.duration)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_offsets_include_debounce_delay() {
        let table = SegmentTable::build(&[5.0, 3.0, 4.0], 0.4).unwrap();
        let offsets: Vec<f64> = table.iter().map(|s| s.offset).collect();

        assert_eq!(offsets.len(), 3);
        assert_close(offsets[0], 0.4);
        assert_close(offsets[1], 5.4);
        assert_close(offsets[2], 8.4);
        assert_close(table.total_duration(), 12.0);
    }

    #[test]
    fn test_offsets_strictly_increasing() {
        let configs: [&[f64]; 4] = [
            &[1.0],
            &[0.01, 0.01, 0.01],
            &[120.0, 3.5, 0.25, 60.0, 9.0],
            &[2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
        ];

        for durations in configs {
            for delay in [0.0, 0.4, 1.5] {
                let table = SegmentTable::build(durations, delay).unwrap();
                assert_close(table.offset(0).unwrap(), delay);
                let offsets: Vec<f64> = table.iter().map(|s| s.offset).collect();
                assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{offsets:?}");
                for (i, segment) in table.iter().enumerate() {
                    assert_eq!(segment.index, i);
                    assert_eq!(segment.duration, durations[i]);
                }
            }
        }
    }

    #[test]
    fn test_empty_durations_rejected() {
        let result = SegmentTable::build(&[], 0.4);
        assert!(matches!(result, Err(ConfigurationError::EmptyDurations)));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let result = SegmentTable::build(&[5.0, 0.0, 4.0], 0.4);
        assert!(matches!(
            result,
            Err(ConfigurationError::NonPositiveDuration { index: 1, .. })
        ));

        let result = SegmentTable::build(&[5.0, -2.0], 0.4);
        assert!(matches!(
            result,
            Err(ConfigurationError::NonPositiveDuration { index: 1, .. })
        ));

        let result = SegmentTable::build(&[f64::NAN], 0.4);
        assert!(matches!(
            result,
            Err(ConfigurationError::NonPositiveDuration { index: 0, .. })
        ));
    }

    #[test]
    fn test_negative_debounce_delay_rejected() {
        let result = SegmentTable::build(&[5.0], -0.1);
        assert!(matches!(result, Err(ConfigurationError::InvalidConstant { .. })));
    }

    #[test]
    fn test_lookup_out_of_range() {
        let table = SegmentTable::build(&[5.0, 3.0], 0.4).unwrap();
        assert!(table.get(2).is_none());
        assert!(table.offset(2).is_none());
        assert_eq!(table.duration(1), Some(3.0));
        assert_eq!(table.len(), 2);
    }
}
