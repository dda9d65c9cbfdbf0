//! Size-prefixed byte-stream framing shared by every compiled structure.
//!
//! Compilation is strictly two-pass: a node reports its size first, the caller allocates exactly
//! that many bytes, then the node writes itself through a [`Cursor`]. Every frame starts with its
//! own size (`i32`, little-endian, counting the prefix itself), so a reader can skip any frame
//! without knowing what it contains.

/// Bytes taken by the size prefix of every frame.
pub const SIZE_PREFIX: usize = 4;

/// `[size:i32][count:i32]`
pub const COLLECTION_HEADER: usize = SIZE_PREFIX + 4;

/// A structure that can be laid out into a pre-sized arena.
///
/// `size_for_compilation` must be exact: `compile` is expected to advance the cursor by exactly
/// that many bytes.
pub trait Compile {
    fn size_for_compilation(&self) -> usize;

    fn compile(&self, cursor: &mut Cursor<'_>);
}

/// Receives the byte range of every named sub-object while a buffer is being written.
///
/// Purely diagnostic; compilation output does not depend on it.
pub trait CompileObserver {
    fn begin(&mut self, name: &str, start: usize);

    fn end(&mut self, end: usize);
}

/// Write cursor over a pre-sized arena.
pub struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
    observer: Option<&'a mut dyn CompileObserver>,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            observer: None,
        }
    }

    pub fn with_observer(buf: &'a mut [u8], observer: &'a mut dyn CompileObserver) -> Self {
        Self {
            buf,
            pos: 0,
            observer: Some(observer),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Marks the start of a named sub-object for the attached observer, if any.
    pub fn begin(&mut self, name: &str) {
        let pos = self.pos;
        if let Some(observer) = self.observer.as_mut() {
            observer.begin(name, pos);
        }
    }

    pub fn end(&mut self) {
        let pos = self.pos;
        if let Some(observer) = self.observer.as_mut() {
            observer.end(pos);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        assert!(
            end <= self.buf.len(),
            "compiled arena overflow: writing {} bytes at {} into an arena of {}",
            bytes.len(),
            self.pos,
            self.buf.len()
        );
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a frame size or element count as `i32`.
    pub fn write_len(&mut self, len: usize) {
        let Ok(value) = i32::try_from(len) else {
            panic!("compiled length {len} does not fit the i32 size prefix");
        };
        self.write_i32(value);
    }
}

/// Runs both compilation passes and returns the exact-size buffer.
pub fn compile_to_buffer<T: Compile + ?Sized>(node: &T) -> Box<[u8]> {
    let size = node.size_for_compilation();
    let mut buf = vec![0u8; size];
    let written = {
        let mut cursor = Cursor::new(&mut buf);
        node.compile(&mut cursor);
        cursor.position()
    };
    assert_eq!(written, size, "compiled {written} bytes, sized for {size}");
    buf.into_boxed_slice()
}

/// Like [`compile_to_buffer`], reporting sub-object ranges to `observer`.
pub fn compile_to_buffer_observed<T: Compile + ?Sized>(
    node: &T,
    observer: &mut dyn CompileObserver,
) -> Box<[u8]> {
    let size = node.size_for_compilation();
    let mut buf = vec![0u8; size];
    let written = {
        let mut cursor = Cursor::with_observer(&mut buf, observer);
        node.compile(&mut cursor);
        cursor.position()
    };
    assert_eq!(written, size, "compiled {written} bytes, sized for {size}");
    buf.into_boxed_slice()
}

fn array<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

pub fn read_u8(bytes: &[u8], at: usize) -> u8 {
    bytes[at]
}

pub fn read_bool(bytes: &[u8], at: usize) -> bool {
    bytes[at] != 0
}

pub fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(array(bytes, at))
}

pub fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(array(bytes, at))
}

pub fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(array(bytes, at))
}

/// Reads an `i32` length written by [`Cursor::write_len`].
pub fn read_len(bytes: &[u8], at: usize) -> usize {
    usize::try_from(read_i32(bytes, at)).unwrap_or(0)
}

/// Self-reported size of the frame starting at `bytes[0]`.
pub fn frame_size(bytes: &[u8]) -> usize {
    read_len(bytes, 0)
}

/// Slices `bytes` down to the frame that starts at `bytes[0]`.
pub fn frame(bytes: &[u8]) -> &[u8] {
    &bytes[..frame_size(bytes)]
}

/// `N` compiled items back to back, preceded by `[size:i32][count:i32]`.
///
/// The size is computed once, when the collection is prepared, and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    size: usize,
}

impl<T: Compile> Collection<T> {
    pub fn prepare(items: Vec<T>) -> Self {
        let size = COLLECTION_HEADER
            + items
                .iter()
                .map(Compile::size_for_compilation)
                .sum::<usize>();
        Self { items, size }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Compile> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::prepare(iter.into_iter().collect())
    }
}

impl<T: Compile> Compile for Collection<T> {
    fn size_for_compilation(&self) -> usize {
        self.size
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        let start = cursor.position();
        cursor.write_len(self.size);
        cursor.write_len(self.items.len());
        for item in &self.items {
            item.compile(cursor);
        }
        debug_assert_eq!(cursor.position() - start, self.size);
    }
}

/// Read-only view over a compiled [`Collection`].
#[derive(Debug, Clone, Copy)]
pub struct CollectionView<'a> {
    bytes: &'a [u8],
}

impl<'a> CollectionView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: frame(bytes),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn len(&self) -> usize {
        read_len(self.bytes, SIZE_PREFIX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frames(&self) -> Frames<'a> {
        Frames {
            rest: &self.bytes[COLLECTION_HEADER..],
            remaining: self.len(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.frames().nth(index)
    }
}

/// Walks consecutive frames using nothing but their size prefixes.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    rest: &'a [u8],
    remaining: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let size = frame_size(self.rest);
        let (head, tail) = self.rest.split_at(size);
        self.rest = tail;
        self.remaining -= 1;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}
