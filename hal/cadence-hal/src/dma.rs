//! DMA controller abstractions
//!
//! A DMA controller streams rasterized words to a GPIO bank at a fixed
//! clock. Memory handed to it must be physically contiguous per block; the
//! controller is free to return the requested size as several blocks.
//!
//! There is normally a single controller per host. [`DmaRegistry`] holds it
//! so that the output path can look it up instead of reaching for mutable
//! global state.

use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Memory usable by the DMA controller
pub trait DmaMem {
    /// CPU view of the block
    fn bytes(&self) -> &[u8];

    /// Mutable CPU view of the block
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Physical address of the first byte
    fn phys_addr(&self) -> u64;
}

/// A concrete DMA driver
pub trait DmaController {
    /// Memory block type returned by [`DmaController::alloc`]
    type Mem: DmaMem;

    /// Error reported by the driver
    type Error: fmt::Debug;

    /// Allocate `size` bytes of DMA-capable memory
    ///
    /// If not enough contiguous memory is available the controller may
    /// return several blocks totalling `size`.
    fn alloc(&self, size: usize) -> Result<Vec<Self::Mem>, Self::Error>;

    /// Stream `blocks` to the pin numbered `pin` at `rate_hz` words per second
    fn output(&self, rate_hz: u64, pin: u32, blocks: &[Self::Mem]) -> Result<(), Self::Error>;
}

impl<C: DmaController + ?Sized> DmaController for &C {
    type Mem = C::Mem;
    type Error = C::Error;

    fn alloc(&self, size: usize) -> Result<Vec<Self::Mem>, Self::Error> {
        (**self).alloc(size)
    }

    fn output(&self, rate_hz: u64, pin: u32, blocks: &[Self::Mem]) -> Result<(), Self::Error> {
        (**self).output(rate_hz, pin, blocks)
    }
}

/// Errors from the controller registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// A controller is already registered
    AlreadyRegistered,
    /// No controller has been registered yet
    NotRegistered,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyRegistered => {
                f.write_str("dma: support for multiple DMA controllers is not implemented")
            }
            RegistryError::NotRegistered => f.write_str("dma: no DMA controller found"),
        }
    }
}

/// Holds the host's DMA controller
///
/// Registration is expected once, by the CPU driver at init. A second
/// registration is reported rather than overwriting the first.
///
/// ```ignore
/// static DMA: DmaRegistry<&'static Bcm283xDma> = DmaRegistry::new();
///
/// DMA.register(&CONTROLLER)?;
/// let dma = DMA.get()?;
/// ```
pub struct DmaRegistry<C> {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Option<C>>>,
}

impl<C> DmaRegistry<C> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Register the controller
    pub fn register(&self, controller: C) -> Result<(), RegistryError> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(RegistryError::AlreadyRegistered);
            }
            *slot = Some(controller);
            Ok(())
        })
    }

    /// Check whether a controller is registered
    pub fn is_registered(&self) -> bool {
        self.slot.lock(|slot| slot.borrow().is_some())
    }

    /// Remove the registered controller, if any
    ///
    /// Only meant for driver teardown.
    pub fn take(&self) -> Option<C> {
        self.slot.lock(|slot| slot.borrow_mut().take())
    }
}

impl<C: Clone> DmaRegistry<C> {
    /// Get the registered controller
    pub fn get(&self) -> Result<C, RegistryError> {
        self.slot
            .lock(|slot| slot.borrow().clone())
            .ok_or(RegistryError::NotRegistered)
    }
}

impl<C> Default for DmaRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
