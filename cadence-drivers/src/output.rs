//! Streamed signal output through a DMA controller
//!
//! Rasterizes a [`Signal`] for one lane of a GPIO bank and hands the words
//! to the controller. Memory layout, per block list:
//!
//! ```text
//! [assert[0] .. assert[n-1]][deassert[0] .. deassert[n-1]]
//! ```
//!
//! Each word is stored little-endian. The controller may split the
//! allocation into several blocks; words are written across them in order.

use core::fmt;

use cadence_core::config::{ConfigError, LaneConfig};
use cadence_core::raster::{rasterize, RasterError};
use cadence_core::Signal;
use cadence_hal::{DmaController, DmaMem, DmaRegistry, PinOut, RegistryError};

/// Bytes per output word
const WORD_BYTES: usize = 4;

/// Errors from the output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError<E> {
    /// Lane configuration is invalid
    Config(ConfigError),
    /// Signal could not be rasterized
    Raster(RasterError),
    /// Controller reported an error
    Dma(E),
    /// Controller returned less memory than requested
    AllocationTooSmall,
}

impl<E> From<ConfigError> for OutputError<E> {
    fn from(e: ConfigError) -> Self {
        OutputError::Config(e)
    }
}

impl<E> From<RasterError> for OutputError<E> {
    fn from(e: RasterError) -> Self {
        OutputError::Raster(e)
    }
}

impl<E: fmt::Debug> fmt::Display for OutputError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Config(e) => write!(f, "output: {}", e),
            OutputError::Raster(e) => write!(f, "output: {}", e),
            OutputError::Dma(e) => write!(f, "output: dma: {:?}", e),
            OutputError::AllocationTooSmall => f.write_str("output: dma allocation too small"),
        }
    }
}

/// Output path bound to one DMA controller
pub struct DmaOutput<C> {
    controller: C,
}

impl<C: DmaController> DmaOutput<C> {
    /// Use `controller` directly
    pub fn new(controller: C) -> Self {
        Self { controller }
    }

    /// Use the controller registered in `registry`
    pub fn from_registry(registry: &DmaRegistry<C>) -> Result<Self, RegistryError>
    where
        C: Clone,
    {
        registry.get().map(Self::new)
    }

    /// The controller in use
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Stream `signal` on `pin` using the lane described by `config`
    pub fn output<O: PinOut + ?Sized>(
        &self,
        signal: &Signal,
        pin: &O,
        config: &LaneConfig,
    ) -> Result<(), OutputError<C::Error>> {
        let mask = config.mask()?;
        let rate_hz = config.rate_hz()?;
        let buffer = rasterize(signal, config.resolution, mask, config.skip as usize)?;

        let size = 2 * buffer.len() * WORD_BYTES;
        let mut blocks = self.controller.alloc(size).map_err(OutputError::Dma)?;
        let available: usize = blocks.iter().map(|b| b.bytes().len()).sum();
        if available < size {
            warn!("output {}: got {} of {} bytes", pin.number(), available, size);
            return Err(OutputError::AllocationTooSmall);
        }

        let mut bytes = buffer
            .assert()
            .iter()
            .chain(buffer.deassert())
            .flat_map(|w| w.to_le_bytes());
        'fill: for block in blocks.iter_mut() {
            for dst in block.bytes_mut() {
                match bytes.next() {
                    Some(b) => *dst = b,
                    None => break 'fill,
                }
            }
        }

        trace!(
            "output {}: {} words at {} Hz in {} blocks",
            pin.number(),
            buffer.len(),
            rate_hz,
            blocks.len()
        );
        self.controller
            .output(rate_hz, pin.number(), &blocks)
            .map_err(OutputError::Dma)
    }
}
