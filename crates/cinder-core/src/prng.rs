//! Deterministic xorshift generator shared by key generation and magic search.

/// Advance a xorshift64 state. The returned state doubles as the output value.
///
/// A zero state is a fixed point, so seeds must be non-zero.
#[inline]
pub(crate) const fn xorshift64(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

/// Runtime wrapper around [`xorshift64`].
pub(crate) struct Xorshift(u64);

impl Xorshift {
    pub(crate) const fn new(seed: u64) -> Xorshift {
        debug_assert!(seed != 0, "xorshift seed must be non-zero");
        Xorshift(seed)
    }

    #[inline]
    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = xorshift64(self.0);
        self.0
    }

    /// A value with roughly one bit in eight set, the usual shape of a good magic.
    #[inline]
    pub(crate) fn sparse_u64(&mut self) -> u64 {
        self.next_u64() & self.next_u64() & self.next_u64()
    }
}
