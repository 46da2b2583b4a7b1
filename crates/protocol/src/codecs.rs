//! Wire type codecs
//!
//! Fixed-width values are big-endian. Variable-length integers carry 7 data
//! bits per byte, least significant group first, with the high bit set on every
//! byte except the last.
//!
//! Decoding never trusts a length prefix: counts are checked against both a
//! hard limit and the bytes actually left in the buffer before anything is
//! allocated.

use bridge_core::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Maximum encoded size of a 32-bit VarInt
pub const MAX_VARINT_LEN: usize = 5;

/// Maximum encoded size of a 64-bit VarLong
pub const MAX_VARLONG_LEN: usize = 10;

/// Default character limit for length-prefixed strings
pub const DEFAULT_MAX_STRING_LEN: usize = 32767;

/// Hard ceiling on element counts of length-prefixed arrays
pub const MAX_ARRAY_LEN: usize = 1 << 21;

/// Trait for values with a wire representation
///
/// Reading consumes exactly the bytes of one value from the front of the
/// buffer. Writing appends the value's encoding.
pub trait WireType: Sized {
    fn read(buf: &mut Bytes) -> CodecResult<Self>;
    fn write(&self, buf: &mut BytesMut);
}

/// Decode one value from a byte slice
///
/// # Returns
/// The value and the number of bytes it occupied
pub fn decode<T: WireType>(input: &[u8]) -> CodecResult<(T, usize)> {
    let mut buf = Bytes::copy_from_slice(input);
    let value = T::read(&mut buf)?;
    Ok((value, input.len() - buf.remaining()))
}

/// Encode one value into a fresh buffer
pub fn encode<T: WireType>(value: &T) -> BytesMut {
    let mut buf = BytesMut::new();
    value.write(&mut buf);
    buf
}

#[inline]
pub(crate) fn ensure<B: Buf>(buf: &B, needed: usize, what: &'static str) -> CodecResult<()> {
    if buf.remaining() < needed {
        return Err(CodecError::truncated(what, needed, buf.remaining()));
    }
    Ok(())
}

/// Read a VarInt
///
/// # Errors
/// - `Truncated` if the buffer ends while the continuation bit is still set
/// - `Malformed` if the value spans more than 5 bytes
#[inline]
pub fn read_varint<B: Buf>(buf: &mut B) -> CodecResult<i32> {
    let mut value: u32 = 0;
    for position in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::truncated("VarInt", 1, 0));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u32) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(CodecError::malformed("VarInt", "longer than 5 bytes"))
}

/// Write a VarInt
///
/// Negative values are encoded as their two's complement and always take
/// the full 5 bytes.
#[inline]
pub fn write_varint<B: BufMut>(buf: &mut B, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

/// Number of bytes `value` occupies as a VarInt
pub fn varint_len(value: i32) -> usize {
    let value = value as u32;
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Decode a VarInt from the front of a slice
///
/// # Returns
/// The value and the number of bytes consumed
pub fn decode_varint(input: &[u8]) -> CodecResult<(i32, usize)> {
    let mut slice = input;
    let value = read_varint(&mut slice)?;
    Ok((value, input.len() - slice.len()))
}

/// Read a VarLong (at most 10 bytes)
pub fn read_varlong<B: Buf>(buf: &mut B) -> CodecResult<i64> {
    let mut value: u64 = 0;
    for position in 0..MAX_VARLONG_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::truncated("VarLong", 1, 0));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u64) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value as i64);
        }
    }
    Err(CodecError::malformed("VarLong", "longer than 10 bytes"))
}

pub fn write_varlong<B: BufMut>(buf: &mut B, value: i64) {
    let mut value = value as u64;
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

/// Read a VarInt element count for an array
///
/// The count is rejected when negative, above [`MAX_ARRAY_LEN`], or larger
/// than the bytes left (every element takes at least one byte), so a hostile
/// prefix cannot force a large allocation.
pub fn read_array_len(buf: &mut Bytes, what: &'static str) -> CodecResult<usize> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::malformed(what, format!("negative length {}", len)));
    }
    let len = len as usize;
    if len > MAX_ARRAY_LEN {
        return Err(CodecError::malformed(
            what,
            format!("length {} exceeds limit of {}", len, MAX_ARRAY_LEN),
        ));
    }
    ensure(buf, len, what)?;
    Ok(len)
}

/// Read a length-prefixed UTF-8 string
///
/// # Format
/// - VarInt: byte length
/// - UTF-8 bytes
///
/// `max_chars` counts UTF-16 code units, the unit the protocol limits are
/// expressed in. The byte length may not exceed three times that.
pub fn read_string(buf: &mut Bytes, max_chars: usize) -> CodecResult<String> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::malformed("String", format!("negative length {}", len)));
    }
    let len = len as usize;
    let max_bytes = max_chars.saturating_mul(3);
    if len > max_bytes {
        return Err(CodecError::malformed(
            "String",
            format!("{} bytes exceeds limit of {}", len, max_bytes),
        ));
    }
    ensure(buf, len, "String")?;

    let bytes = buf.split_to(len);
    let value = std::str::from_utf8(&bytes)
        .map_err(|e| CodecError::malformed("String", format!("invalid UTF-8: {}", e)))?;
    let chars = value.encode_utf16().count();
    if chars > max_chars {
        return Err(CodecError::malformed(
            "String",
            format!("{} characters exceeds limit of {}", chars, max_chars),
        ));
    }
    Ok(value.to_owned())
}

#[inline]
pub fn write_string(buf: &mut BytesMut, value: &str) {
    write_varint(buf, value.len() as i32);
    buf.put_slice(value.as_bytes());
}

macro_rules! fixed_width {
    ($ty:ty, $size:expr, $get:ident, $put:ident, $what:literal) => {
        impl WireType for $ty {
            #[inline]
            fn read(buf: &mut Bytes) -> CodecResult<Self> {
                ensure(buf, $size, $what)?;
                Ok(buf.$get())
            }

            #[inline]
            fn write(&self, buf: &mut BytesMut) {
                buf.$put(*self);
            }
        }
    };
}

fixed_width!(u8, 1, get_u8, put_u8, "UnsignedByte");
fixed_width!(i8, 1, get_i8, put_i8, "Byte");
fixed_width!(u16, 2, get_u16, put_u16, "UnsignedShort");
fixed_width!(i16, 2, get_i16, put_i16, "Short");
fixed_width!(i32, 4, get_i32, put_i32, "Int");
fixed_width!(i64, 8, get_i64, put_i64, "Long");
fixed_width!(f32, 4, get_f32, put_f32, "Float");
fixed_width!(f64, 8, get_f64, put_f64, "Double");

impl WireType for bool {
    /// Only 0 and 1 are accepted so the value re-encodes to the same byte
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        ensure(buf, 1, "Boolean")?;
        match buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::malformed(
                "Boolean",
                format!("byte {:#04x} is neither 0 nor 1", other),
            )),
        }
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8);
    }
}

/// 32-bit integer in VarInt encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarInt(pub i32);

impl WireType for VarInt {
    #[inline]
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        read_varint(buf).map(VarInt)
    }

    #[inline]
    fn write(&self, buf: &mut BytesMut) {
        write_varint(buf, self.0);
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// 64-bit integer in VarLong encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarLong(pub i64);

impl WireType for VarLong {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        read_varlong(buf).map(VarLong)
    }

    fn write(&self, buf: &mut BytesMut) {
        write_varlong(buf, self.0);
    }
}

impl WireType for String {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        read_string(buf, DEFAULT_MAX_STRING_LEN)
    }

    fn write(&self, buf: &mut BytesMut) {
        write_string(buf, self);
    }
}

/// 128-bit UUID, most significant half first
impl WireType for Uuid {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        ensure(buf, 16, "UUID")?;
        Ok(Uuid::from_u128(buf.get_u128()))
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u128(self.as_u128());
    }
}

/// Optional value behind a boolean presence flag
impl<T: WireType> WireType for Option<T> {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        if bool::read(buf)? {
            Ok(Some(T::read(buf)?))
        } else {
            Ok(None)
        }
    }

    fn write(&self, buf: &mut BytesMut) {
        match self {
            Some(value) => {
                true.write(buf);
                value.write(buf);
            }
            None => false.write(buf),
        }
    }
}

/// VarInt-counted array
impl<T: WireType> WireType for Vec<T> {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        let len = read_array_len(buf, "Array")?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::read(buf)?);
        }
        Ok(items)
    }

    fn write(&self, buf: &mut BytesMut) {
        write_varint(buf, self.len() as i32);
        for item in self {
            item.write(buf);
        }
    }
}

/// VarInt-length byte array, kept as a zero-copy slice of the input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteArray(pub Bytes);

impl WireType for ByteArray {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        let len = read_array_len(buf, "ByteArray")?;
        Ok(ByteArray(buf.split_to(len)))
    }

    fn write(&self, buf: &mut BytesMut) {
        write_varint(buf, self.0.len() as i32);
        buf.put_slice(&self.0);
    }
}

/// Every byte left in the packet, unprefixed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemainingBytes(pub Bytes);

impl WireType for RemainingBytes {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        let len = buf.remaining();
        Ok(RemainingBytes(buf.split_to(len)))
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }
}
