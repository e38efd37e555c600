//! This module contains the pure, stateless kernel for decoding raw binary
//! spectrum buffers.
//!
//! A processed Bruker spectrum (`1r`/`1i`) is a flat sequence of fixed-width
//! integers whose byte order and power-factor scaling (`NC_proc`) are declared
//! in the processing parameter file. The kernel reinterprets the buffer as the
//! declared element type, widens to `f64`, and applies the `2^nc` scaling so
//! the result is a physically meaningful intensity sequence. This module is
//! PURE RUST, panic-free, and relies on `bytemuck` for safety.

use bytemuck::Pod;
use num_traits::ToPrimitive;

use crate::error::NmrError;
use crate::types::{ByteOrder, RawSpectrum};

/// Largest element width the byte-swapping scratch buffer supports.
const MAX_ELEMENT_WIDTH: usize = 16;

//==================================================================================
// 1. Private Core Logic
//==================================================================================

/// Internal function to reinterpret a byte buffer as a sequence of `T` in the
/// requested byte order, widened to `f64`.
fn decode_internal<T>(bytes: &[u8], byte_order: ByteOrder) -> Result<Vec<f64>, NmrError>
where
    T: Pod + ToPrimitive,
{
    let width = std::mem::size_of::<T>();
    if width == 0 || width > MAX_ELEMENT_WIDTH {
        return Err(NmrError::Internal(format!(
            "Unsupported element width {} for {}",
            width,
            std::any::type_name::<T>()
        )));
    }
    if bytes.len() % width != 0 {
        return Err(NmrError::BufferMismatch(width, bytes.len()));
    }

    let native = byte_order == ByteOrder::native();
    let mut swap = [0u8; MAX_ELEMENT_WIDTH];
    let mut out = Vec::with_capacity(bytes.len() / width);

    for chunk in bytes.chunks_exact(width) {
        let value: T = if native {
            bytemuck::pod_read_unaligned(chunk)
        } else {
            let swap = &mut swap[..width];
            swap.copy_from_slice(chunk);
            swap.reverse();
            bytemuck::pod_read_unaligned(swap)
        };
        let real = value.to_f64().ok_or_else(|| {
            NmrError::Format(format!(
                "Element of type {} is not representable as f64",
                std::any::type_name::<T>()
            ))
        })?;
        out.push(real);
    }
    Ok(out)
}

//==================================================================================
// 2. Public API (Generic, Performant, Decoupled)
//==================================================================================

/// Decodes a raw intensity buffer into a `RawSpectrum`.
///
/// Each raw element is multiplied by `2^scale_exponent` (the `NC_proc` power
/// factor). `T` is the on-disk element type: `i32` for every IVDr-era
/// processed spectrum, kept generic so newer double-precision exports decode
/// through the same path.
pub fn decode_intensities<T>(
    bytes: &[u8],
    byte_order: ByteOrder,
    scale_exponent: i32,
) -> Result<RawSpectrum, NmrError>
where
    T: Pod + ToPrimitive,
{
    let mut values = decode_internal::<T>(bytes, byte_order)?;

    if scale_exponent != 0 {
        let scale = (scale_exponent as f64).exp2();
        for value in &mut values {
            *value *= scale;
        }
    }

    Ok(RawSpectrum::new(values))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
