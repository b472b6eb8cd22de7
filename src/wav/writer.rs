//! A byte buffer with a write cursor and typed fixed-width primitives.

/// Growable byte buffer written through a position cursor.
///
/// Writes land at the cursor and advance it; writing past the current end
/// extends the buffer with zeros.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor. Seeking past the end is allowed; the gap is
    /// zero-filled on the next write.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if self.pos == self.buf.len() {
            self.buf.extend_from_slice(bytes);
        } else {
            if end > self.buf.len() {
                self.buf.resize(end, 0);
            }
            self.buf[self.pos..end].copy_from_slice(bytes);
        }
        self.pos = end;
    }

    /// Four-character chunk identifier such as `RIFF`, written as raw ASCII
    /// (big-endian when read as a `u32`).
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.write_bytes(tag);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Low three bytes of `v`, least significant first.
    pub fn write_i24_le(&mut self, v: i32) {
        let bytes = v.to_le_bytes();
        self.write_bytes(&bytes[..3]);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32_be(&mut self, v: u32) {
        self.write_bytes(&v.to_be_bytes());
    }
}
