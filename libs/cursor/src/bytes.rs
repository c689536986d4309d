use medbridge_record::{ParseError, Result};

/// Byte order for multi-byte integer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Forward-only reader over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Switch byte order, e.g. after the file-meta group of a big-endian file.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < wanted {
            return Err(ParseError::UnexpectedEndOfInput {
                offset: self.data.len(),
                needed: wanted - remaining,
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let span = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(span)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let raw = self.read_array::<2>()?;
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let raw = self.read_array::<4>()?;
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    /// Look at the next `u16` without consuming it.
    pub fn peek_u16(&self) -> Result<u16> {
        self.ensure(2)?;
        let raw = [self.data[self.position], self.data[self.position + 1]];
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }
}
