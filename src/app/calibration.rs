//! Raw sample to temperature conversion

use crate::bsp::adc::Sample;

/// Linear sensor model: `celsius = (volts_per_count * raw - offset_volts) * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub volts_per_count: f32,
    pub offset_volts: f32,
    pub scale: f32,
}

impl Calibration {
    /// 3.3 V over 12 bits, 500 mV offset, 10 mV per degree
    pub const DEFAULT: Calibration = Calibration {
        volts_per_count: 0.00081,
        offset_volts: 0.5,
        scale: 100.0,
    };

    #[inline]
    pub fn volts(&self, sample: Sample) -> f32 {
        self.volts_per_count * sample as f32
    }

    /// Whole degrees, truncated toward zero
    pub fn celsius(&self, sample: Sample) -> i32 {
        ((self.volts(sample) - self.offset_volts) * self.scale) as i32
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_nine_volts_reads_forty_degrees() {
        let cal = Calibration::DEFAULT;
        assert!((cal.volts(1112) - 0.9007).abs() < 1e-3);
        assert_eq!(cal.celsius(1112), 40);
        assert_eq!(cal.celsius(1111), 39);
    }

    #[test]
    fn below_offset_goes_negative() {
        let cal = Calibration::DEFAULT;
        assert_eq!(cal.celsius(0), -50);
        // -0.4 degrees truncates to zero, not -1
        assert_eq!(cal.celsius(612), 0);
    }
}
