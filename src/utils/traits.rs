use serde::{de::DeserializeOwned, Serialize};

use crate::fs::{FsError, Result};

/// Trait for records stored in fixed-size, zero-padded slots on the device
/// # Note
/// Records are encoded with [bincode]'s legacy configuration,
/// i.e. little-endian fixed-width integers, so the byte layout only depends on
/// the field order of the implementing type
pub trait FixedRecord: Serialize + DeserializeOwned {
    /// size of one on-disk slot, the encoded record must fit into it
    const RECORD_SIZE: usize;

    /// serialize into `slot`, zeroing the padding behind the record
    /// # Returns
    /// The number of bytes used by the record if successful
    fn encode_into(&self, slot: &mut [u8]) -> Result<usize> {
        if slot.len() != Self::RECORD_SIZE {
            return Err(FsError::Corrupted(format!(
                "record slot is {} bytes, expected {}",
                slot.len(),
                Self::RECORD_SIZE
            )));
        }
        slot.fill(0);
        let config = bincode::config::legacy();
        Ok(bincode::serde::encode_into_slice(self, slot, config)?)
    }

    /// deserialize from a slot of exactly [FixedRecord::RECORD_SIZE] bytes
    fn decode_from(slot: &[u8]) -> Result<Self> {
        if slot.len() != Self::RECORD_SIZE {
            return Err(FsError::Corrupted(format!(
                "record slot is {} bytes, expected {}",
                slot.len(),
                Self::RECORD_SIZE
            )));
        }
        let config = bincode::config::legacy();
        let (record, _bytes_read): (Self, usize) =
            bincode::serde::decode_from_slice(slot, config)?;
        Ok(record)
    }

    /// number of bytes the record occupies before padding
    fn encoded_len(&self) -> Result<usize> {
        let config = bincode::config::legacy();
        Ok(bincode::serde::encode_to_vec(self, config)?.len())
    }
}
