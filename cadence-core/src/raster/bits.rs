//! Single-channel rasterization into a packed bit stream
//!
//! Used by peripherals that shift one pin out of a FIFO (PCM, PWM serializer)
//! rather than driving a GPIO bank. The destination's own resolution and bit
//! order define the output clock and the packing.

use cadence_hal::Level;

use super::{covers, BitPolicy, RasterError, Sink, Walker};
use crate::signal::{BitStream, Signal};

struct Bits<'a> {
    out: &'a mut BitStream,
}

impl Sink for Bits<'_> {
    fn slots(&self) -> usize {
        self.out.len_bits()
    }

    fn put(&mut self, slot: usize, level: Level) {
        self.out.set_bit(slot, level);
    }
}

/// Rasterize `signal` into `out`, one bit per `out.resolution()`
///
/// Bit stream sources must share the destination resolution; their bytes are
/// copied as-is and bit-reversed when the orders differ. Bits past the end
/// of the source are left untouched.
pub fn raster_bits(signal: &Signal, out: &mut BitStream) -> Result<(), RasterError> {
    signal.validate()?;
    out.validate()?;

    match signal {
        Signal::BitStream(src) => copy_stream(src, out),
        Signal::EdgeStream(e) => {
            let walker = Walker {
                resolution: out.resolution(),
                bits: BitPolicy::Exact,
            };
            walker.check_edges(e)?;
            let count = out.len_bits();
            if !covers(walker.resolution, count, e.duration()) {
                return Err(RasterError::BufferTooShort);
            }
            walker.render_edges(e, &mut Bits { out }, 0, count)?;
            Ok(())
        }
        Signal::Program(_) => {
            let walker = Walker {
                resolution: out.resolution(),
                bits: BitPolicy::Exact,
            };
            if walker.slots(signal)? > out.len_bits() {
                return Err(RasterError::BufferTooShort);
            }
            walker.render(signal, &mut Bits { out }, 0)?;
            Ok(())
        }
    }
}

fn copy_stream(src: &BitStream, out: &mut BitStream) -> Result<(), RasterError> {
    if src.resolution() != out.resolution() {
        return Err(RasterError::ResolutionMismatch);
    }
    if src.bytes().len() > out.bytes().len() {
        return Err(RasterError::BufferTooShort);
    }
    let reverse = src.order() != out.order();
    for (dst, &byte) in out.bytes_mut().iter_mut().zip(src.bytes()) {
        *dst = if reverse { byte.reverse_bits() } else { byte };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Feature;
    use crate::signal::{BitOrder, EdgeStream, Loops, Program};
    use alloc::vec;
    use core::time::Duration;

    const US: Duration = Duration::from_micros(1);

    fn lsb(len: usize) -> BitStream {
        BitStream::zeroed(US, len, BitOrder::LsbFirst).unwrap()
    }

    #[test]
    fn test_copy_same_order() {
        let src: Signal = BitStream::new(US, vec![0x12, 0x34], BitOrder::LsbFirst)
            .unwrap()
            .into();
        let mut out = lsb(3);
        raster_bits(&src, &mut out).unwrap();
        assert_eq!(out.bytes(), &[0x12, 0x34, 0x00]);
    }

    #[test]
    fn test_copy_converts_order() {
        let src: Signal = BitStream::new(US, vec![0b1100_0000], BitOrder::MsbFirst)
            .unwrap()
            .into();
        let mut out = lsb(1);
        raster_bits(&src, &mut out).unwrap();
        assert_eq!(out.bytes(), &[0b0000_0011]);
        // Emission order is preserved
        assert_eq!(out.bit(0), Level::High);
        assert_eq!(out.bit(1), Level::High);
        assert_eq!(out.bit(2), Level::Low);
    }

    #[test]
    fn test_copy_errors() {
        let src: Signal = BitStream::new(US, vec![0xFF; 4], BitOrder::LsbFirst)
            .unwrap()
            .into();

        let mut slow = BitStream::zeroed(US * 2, 8, BitOrder::LsbFirst).unwrap();
        assert_eq!(
            raster_bits(&src, &mut slow),
            Err(RasterError::ResolutionMismatch)
        );

        let mut short = lsb(3);
        assert_eq!(raster_bits(&src, &mut short), Err(RasterError::BufferTooShort));
        assert_eq!(short.bytes(), &[0, 0, 0]);
    }

    #[test]
    fn test_edge_stream() {
        let e: Signal = EdgeStream::new(US, vec![US * 2, US * 4]).unwrap().into();
        let mut out = lsb(1);
        raster_bits(&e, &mut out).unwrap();
        // HH LL HHHH, LSB first
        assert_eq!(out.bytes(), &[0b1111_0011]);

        let mut coarse = BitStream::zeroed(US * 2, 1, BitOrder::LsbFirst).unwrap();
        let fine: Signal = EdgeStream::new(US, vec![US]).unwrap().into();
        assert_eq!(
            raster_bits(&fine, &mut coarse),
            Err(RasterError::ResolutionTooCoarse)
        );

        let long: Signal = EdgeStream::new(US, vec![US * 9]).unwrap().into();
        assert_eq!(raster_bits(&long, &mut lsb(1)), Err(RasterError::BufferTooShort));
    }

    #[test]
    fn test_program() {
        let ones: Signal = BitStream::new(US, vec![0xFF], BitOrder::MsbFirst)
            .unwrap()
            .into();
        let zeros: Signal = BitStream::new(US, vec![0x00], BitOrder::MsbFirst)
            .unwrap()
            .into();
        let p: Signal = Program::new(vec![ones, zeros], Loops::Count(2)).unwrap().into();
        let mut out = lsb(4);
        raster_bits(&p, &mut out).unwrap();
        assert_eq!(out.bytes(), &[0xFF, 0x00, 0xFF, 0x00]);

        assert_eq!(raster_bits(&p, &mut lsb(3)), Err(RasterError::BufferTooShort));
    }

    #[test]
    fn test_program_requires_matching_bit_resolution() {
        let slow: Signal = BitStream::new(US * 2, vec![0xFF], BitOrder::MsbFirst)
            .unwrap()
            .into();
        let p: Signal = Program::once(vec![slow]).unwrap().into();
        assert_eq!(
            raster_bits(&p, &mut lsb(4)),
            Err(RasterError::ResolutionMismatch)
        );
    }

    #[test]
    fn test_infinite_program() {
        let ones: Signal = BitStream::new(US, vec![0xFF], BitOrder::MsbFirst)
            .unwrap()
            .into();
        let p: Signal = Program::new(vec![ones], Loops::Forever).unwrap().into();
        assert_eq!(
            raster_bits(&p, &mut lsb(4)),
            Err(RasterError::Unimplemented(Feature::InfiniteProgram))
        );
    }
}
