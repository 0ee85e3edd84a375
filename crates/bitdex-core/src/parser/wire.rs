use crate::error::ParseError;

/// Forward-only cursor over a serialised block or transaction.
///
/// Every read names the field it is reading so failures can point at the
/// offending offset.
pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes between `start` and the current position.
    pub(crate) fn since(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }

    pub(crate) fn peek_u8(&self, field: &'static str) -> Result<u8, ParseError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.truncated(field, 1))
    }

    pub(crate) fn read_bytes(
        &mut self,
        len: usize,
        field: &'static str,
    ) -> Result<&'a [u8], ParseError> {
        if self.remaining() < len {
            return Err(self.truncated(field, len));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, len: usize, field: &'static str) -> Result<(), ParseError> {
        self.read_bytes(len, field).map(|_| ())
    }

    /// Skip `count` records of `size` bytes each.
    pub(crate) fn skip_records(
        &mut self,
        count: u64,
        size: usize,
        field: &'static str,
    ) -> Result<(), ParseError> {
        let len = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(size))
            .ok_or_else(|| self.truncated(field, usize::MAX))?;
        self.skip(len, field)
    }

    pub(crate) fn read_array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], ParseError> {
        let bytes = self.read_bytes(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self, field: &'static str) -> Result<u8, ParseError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub(crate) fn read_u16_le(&mut self, field: &'static str) -> Result<u16, ParseError> {
        self.read_array(field).map(u16::from_le_bytes)
    }

    pub(crate) fn read_u32_le(&mut self, field: &'static str) -> Result<u32, ParseError> {
        self.read_array(field).map(u32::from_le_bytes)
    }

    pub(crate) fn read_i32_le(&mut self, field: &'static str) -> Result<i32, ParseError> {
        self.read_array(field).map(i32::from_le_bytes)
    }

    pub(crate) fn read_u64_le(&mut self, field: &'static str) -> Result<u64, ParseError> {
        self.read_array(field).map(u64::from_le_bytes)
    }

    /// Bitcoin `CompactSize`. Non-canonical encodings are rejected.
    pub(crate) fn read_varint(&mut self, field: &'static str) -> Result<u64, ParseError> {
        let start = self.pos;
        let prefix = self.read_u8(field)?;
        let (value, min) = match prefix {
            0xfd => (u64::from(self.read_u16_le(field)?), 0xfd),
            0xfe => (u64::from(self.read_u32_le(field)?), 0x1_0000),
            0xff => (self.read_u64_le(field)?, 0x1_0000_0000),
            n => return Ok(u64::from(n)),
        };
        if value < min {
            return Err(ParseError::InvalidVarInt {
                offset: start,
                field,
            });
        }
        Ok(value)
    }

    /// A varint count of records at least `min_record` bytes long.
    ///
    /// Returns the count and a capacity hint bounded by what the rest of
    /// the buffer could possibly hold.
    pub(crate) fn read_count(
        &mut self,
        field: &'static str,
        min_record: usize,
    ) -> Result<(u64, usize), ParseError> {
        let count = self.read_varint(field)?;
        let fits = self.remaining() / min_record.max(1);
        let hint = usize::try_from(count).unwrap_or(usize::MAX).min(fits);
        Ok((count, hint))
    }

    pub(crate) fn read_var_bytes(&mut self, field: &'static str) -> Result<&'a [u8], ParseError> {
        let len = self.read_varint(field)?;
        let len = usize::try_from(len).map_err(|_| self.truncated(field, usize::MAX))?;
        self.read_bytes(len, field)
    }

    fn truncated(&self, field: &'static str, needed: usize) -> ParseError {
        ParseError::TruncatedStream {
            offset: self.pos,
            field,
            needed,
        }
    }
}
