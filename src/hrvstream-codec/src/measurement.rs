use hrvstream_types::RawBeatSample;
use serde::{Deserialize, Serialize};

use crate::{CodecError, helpers::PayloadReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorContact {
    NotSupported,
    NotDetected,
    Detected,
}

/// Decoded Heart Rate Measurement characteristic (GATT 0x2A37).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateMeasurement {
    pub bpm: u16,
    pub contact: SensorContact,
    pub energy_expended_kj: Option<u16>,
    /// RR intervals in the sensor's native 1/1024 s resolution.
    pub rr_raw: Vec<u16>,
}

impl HeartRateMeasurement {
    const FLAG_HR_U16: u8 = 0x01;
    const FLAG_CONTACT_DETECTED: u8 = 0x02;
    const FLAG_CONTACT_SUPPORTED: u8 = 0x04;
    const FLAG_ENERGY_EXPENDED: u8 = 0x08;
    const FLAG_RR_PRESENT: u8 = 0x10;

    const RR_TICKS_PER_SECOND: f64 = 1024.0;

    pub fn from_data(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::new(data);
        let flags = reader
            .read_u8("flags")
            .map_err(|_| CodecError::EmptyPayload)?;

        let bpm = match flags & Self::FLAG_HR_U16 != 0 {
            true => reader.read_u16_le("heart rate")?,
            false => u16::from(reader.read_u8("heart rate")?),
        };

        let contact = match (
            flags & Self::FLAG_CONTACT_SUPPORTED != 0,
            flags & Self::FLAG_CONTACT_DETECTED != 0,
        ) {
            (false, _) => SensorContact::NotSupported,
            (true, false) => SensorContact::NotDetected,
            (true, true) => SensorContact::Detected,
        };

        let energy_expended_kj = match flags & Self::FLAG_ENERGY_EXPENDED != 0 {
            true => Some(reader.read_u16_le("energy expended")?),
            false => None,
        };

        let mut rr_raw = Vec::new();
        if flags & Self::FLAG_RR_PRESENT != 0 {
            if reader.remaining() % 2 != 0 {
                return Err(CodecError::OddRrPayload);
            }
            while reader.remaining() > 0 {
                rr_raw.push(reader.read_u16_le("rr interval")?);
            }
        }

        Ok(Self {
            bpm,
            contact,
            energy_expended_kj,
            rr_raw,
        })
    }

    pub fn from_hex(payload: &str) -> Result<Self, CodecError> {
        Self::from_data(&hex::decode(payload.trim())?)
    }

    pub fn rr_intervals_ms(&self) -> Vec<f64> {
        self.rr_raw
            .iter()
            .map(|&ticks| f64::from(ticks) * 1000.0 / Self::RR_TICKS_PER_SECOND)
            .collect()
    }

    /// Whether the strap reports that it has lost skin contact.
    pub fn is_off_body(&self) -> bool {
        matches!(self.contact, SensorContact::NotDetected)
    }

    pub fn into_sample(self) -> RawBeatSample {
        RawBeatSample::new(self.bpm, self.rr_intervals_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_u8_heart_rate_with_rr() {
        let m = HeartRateMeasurement::from_hex("10480004").unwrap();
        assert_eq!(m.bpm, 72);
        assert_eq!(m.contact, SensorContact::NotSupported);
        assert_eq!(m.energy_expended_kj, None);
        assert_eq!(m.rr_raw, vec![1024]);
        assert_eq!(m.rr_intervals_ms(), vec![1000.0]);
    }

    #[test]
    fn decodes_u16_heart_rate_energy_and_rr() {
        let m = HeartRateMeasurement::from_hex("19b40010005501").unwrap();
        assert_eq!(m.bpm, 180);
        assert_eq!(m.energy_expended_kj, Some(16));
        assert_eq!(m.rr_raw, vec![0x0155]);
        let rr = m.rr_intervals_ms();
        assert!((rr[0] - 333.0078125).abs() < 1e-9);
    }

    #[test]
    fn decodes_sensor_contact_bits() {
        let detected = HeartRateMeasurement::from_data(&[0x06, 60]).unwrap();
        assert_eq!(detected.contact, SensorContact::Detected);
        assert!(!detected.is_off_body());

        let lost = HeartRateMeasurement::from_data(&[0x04, 60]).unwrap();
        assert_eq!(lost.contact, SensorContact::NotDetected);
        assert!(lost.is_off_body());
    }

    #[test]
    fn multiple_rr_intervals_keep_order() {
        let m = HeartRateMeasurement::from_data(&[0x10, 70, 0x00, 0x04, 0x00, 0x03]).unwrap();
        assert_eq!(m.rr_intervals_ms(), vec![1000.0, 750.0]);
        let sample = m.into_sample();
        assert_eq!(sample.heart_rate_bpm, 70);
        assert_eq!(sample.rr_intervals_ms, vec![1000.0, 750.0]);
    }

    #[test]
    fn rr_flag_without_intervals_is_empty() {
        let m = HeartRateMeasurement::from_data(&[0x10, 70]).unwrap();
        assert!(m.rr_raw.is_empty());
    }

    #[test]
    fn errors_on_malformed_payloads() {
        assert_eq!(
            HeartRateMeasurement::from_data(&[]),
            Err(CodecError::EmptyPayload)
        );
        assert_eq!(
            HeartRateMeasurement::from_data(&[0x01, 0x48]),
            Err(CodecError::Truncated("heart rate"))
        );
        assert_eq!(
            HeartRateMeasurement::from_data(&[0x08, 0x48, 0x01]),
            Err(CodecError::Truncated("energy expended"))
        );
        assert_eq!(
            HeartRateMeasurement::from_data(&[0x10, 0x48, 0x00, 0x04, 0x01]),
            Err(CodecError::OddRrPayload)
        );
        assert!(matches!(
            HeartRateMeasurement::from_hex("zz"),
            Err(CodecError::InvalidHex(_))
        ));
    }
}
