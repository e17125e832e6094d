use crate::CodecError;

/// Little-endian cursor over a characteristic payload.
pub(crate) struct PayloadReader<'a> {
    data: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let Some((head, tail)) = self.data.split_first_chunk::<N>() else {
            return Err(CodecError::Truncated(field));
        };
        self.data = tail;
        Ok(*head)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        let [byte] = self.take::<1>(field)?;
        Ok(byte)
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take(field)?))
    }
}
