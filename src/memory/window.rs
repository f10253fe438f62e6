//! Address decoding for buffers loaded at a known base address

/// A byte buffer as seen by a program which has it loaded at `base`.
///
/// Every absolute address embedded in a relocatable blob only makes sense
/// relative to the address the blob was assembled for. A `Window` pairs the
/// raw bytes with that address so that embedded pointers can be decoded into
/// buffer offsets without the caller redoing the arithmetic.
#[derive(Copy, Clone, Debug)]
pub struct Window<'a> {
    data: &'a [u8],
    base: u16,
}

impl<'a> Window<'a> {
    pub fn new(data: &'a [u8], base: u16) -> Self {
        Window { data, base }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode an address into a buffer offset.
    ///
    /// Yields `None` for addresses below the base. The offset is not checked
    /// against the buffer length; use `check_addr` for that.
    pub fn decode_addr(&self, addr: u16) -> Option<usize> {
        addr.checked_sub(self.base).map(usize::from)
    }

    /// Determine if `size` bytes starting at `addr` lie within the buffer.
    ///
    /// A null address is never inside the buffer; it is accepted only when
    /// `allow_null` is set.
    pub fn check_addr(&self, addr: u16, size: usize, allow_null: bool) -> bool {
        if addr == 0 {
            return allow_null;
        }

        match self.decode_addr(addr) {
            Some(offset) => offset + size <= self.data.len(),
            None => false,
        }
    }

    /// Retrieve `count` bytes at a given offset.
    pub fn retrieve(&self, offset: usize, count: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(count)?)
    }

    pub fn read_u8(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    /// Read a little-endian word at a given offset.
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.retrieve(offset, 2)?;

        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read `count` consecutive little-endian words.
    pub fn read_u16_array(&self, offset: usize, count: usize) -> Option<Vec<u16>> {
        let bytes = self.retrieve(offset, count.checked_mul(2)?)?;

        Some(
            bytes
                .chunks_exact(2)
                .map(|w| u16::from_le_bytes([w[0], w[1]]))
                .collect(),
        )
    }
}

/// Store a little-endian word into a buffer.
///
/// The offset must have been validated against the buffer beforehand.
pub fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}
