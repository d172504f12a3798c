//! Raw CAN frames forwarded by a gateway task.

use std::fmt;

/// Extended Frame Format mask (29-bit identifiers).
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// A classic CAN frame: 29-bit identifier and up to 8 data bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanFrame {
    /// Frame identifier, masked to the extended format range.
    pub can_id: u32,
    /// Number of valid bytes in `data` (0..=8).
    pub dlc: u8,
    /// Data payload.
    pub data: [u8; 8],
}

impl CanFrame {
    /// Builds a frame from an identifier and payload slice.
    ///
    /// The identifier is masked to 29 bits and the payload truncated to the
    /// first 8 bytes.
    pub fn new(can_id: u32, payload: &[u8]) -> Self {
        let mut data = [0u8; 8];
        let dlc = payload.len().min(8);
        data[..dlc].copy_from_slice(&payload[..dlc]);
        Self {
            can_id: can_id & CAN_EFF_MASK,
            dlc: dlc as u8,
            data,
        }
    }

    /// Valid data bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc)]
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "can 0x{:08X} [{}]", self.can_id, self.dlc)?;
        for byte in self.bytes() {
            write!(f, " {byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_masks_id_and_truncates_payload() {
        let frame = CanFrame::new(0xFFFF_FFFF, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(frame.can_id, CAN_EFF_MASK);
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
