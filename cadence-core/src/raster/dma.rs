//! Copy into PCM/PWM FIFO words
//!
//! These peripherals shift a 32-bit FIFO word out MSB first, so an MSB-first
//! bit stream maps onto them byte for byte.

use super::{Feature, RasterError};
use crate::signal::{BitOrder, Signal};

/// Pack `signal` into `dst` as big-endian 32-bit words
///
/// The trailing partial word, if any, is zero-padded. Words past the end of
/// the stream are left untouched.
pub fn copy_to_dma_words(signal: &Signal, dst: &mut [u32]) -> Result<(), RasterError> {
    signal.validate()?;
    let stream = match signal {
        Signal::BitStream(b) => b,
        Signal::EdgeStream(_) => return Err(RasterError::Unimplemented(Feature::EdgeStreamDmaCopy)),
        Signal::Program(_) => return Err(RasterError::Unimplemented(Feature::ProgramDmaCopy)),
    };
    if stream.order() == BitOrder::LsbFirst {
        return Err(RasterError::Unimplemented(Feature::LsbFirstDmaCopy));
    }

    let bytes = stream.bytes();
    let words = bytes.len().div_ceil(4);
    if words > dst.len() {
        return Err(RasterError::BufferTooShort);
    }
    for (word, chunk) in dst.iter_mut().zip(bytes.chunks(4)) {
        let mut be = [0u8; 4];
        be[..chunk.len()].copy_from_slice(chunk);
        *word = u32::from_be_bytes(be);
    }
    Ok(())
}
