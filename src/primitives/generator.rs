//! Generators produce the opaque handles for codes, access and refresh tokens.
//!
//! The provided implementation depends on the entropy of the generated value to
//! make guessing infeasible; handles carry no recoverable structure.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Mints opaque token handles.
///
/// ## Requirements on implementations
///
/// Each produced value MUST be indistinguishable from random to anyone who has
/// observed previously produced values, and collisions must be negligible over
/// the lifetime of the store. Random generators with at least 256 bits of
/// entropy per value satisfy both.
pub trait ValueGenerator {
    /// Produce a fresh handle.
    fn generate(&mut self) -> Result<String, ()>;
}

/// A [`ValueGenerator`] backed by a cryptographically secure source of randomness.
pub struct RandGenerator {
    rand: StdRng,
    len: usize,
}

impl RandGenerator {
    /// Create a generator producing `len` random bytes per handle, base64url
    /// encoded without padding. Use at least 32 bytes for token values.
    pub fn new(len: usize) -> Self {
        RandGenerator {
            rand: StdRng::from_entropy(),
            len,
        }
    }
}

impl ValueGenerator for RandGenerator {
    fn generate(&mut self) -> Result<String, ()> {
        let mut result = vec![0; self.len];
        self.rand.try_fill(result.as_mut_slice()).map_err(|_| ())?;
        Ok(URL_SAFE_NO_PAD.encode(&result))
    }
}

impl<'a, T: ValueGenerator + ?Sized + 'a> ValueGenerator for Box<T> {
    fn generate(&mut self) -> Result<String, ()> {
        (&mut **self).generate()
    }
}

impl<'a, T: ValueGenerator + ?Sized + 'a> ValueGenerator for &'a mut T {
    fn generate(&mut self) -> Result<String, ()> {
        (&mut **self).generate()
    }
}
