//! Type-driven checksumming and packing
//!
//! Every persisted value implements [`Persist`]. Plain values (fixed width
//! integers, floats, `bool` and fixed size arrays of those) are fed to the sink
//! straight from their native byte representation. Everything else needs an
//! explicit rule: strings contribute their content bytes, time points their
//! integral seconds, bit vectors their integer value, and composite entities the
//! concatenation of their fields in a single declared order (see
//! [`persist_fields!`](crate::persist_fields)).
//!
//! The same traversal drives [`Persist::checksum`], [`Persist::pack`] and
//! [`Persist::unpack`], so two values with equal packed bytes always have equal
//! checksums and a packed value always unpacks to an equal value.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::SerializationError;

/// Consumer of a checksum octet stream.
///
/// Any `FnMut(u8)` is a sink, so hashing backends and test collectors can be plain
/// closures.
pub trait ChecksumSink {
    fn put(&mut self, octet: u8);
}

impl<F: FnMut(u8)> ChecksumSink for F {
    fn put(&mut self, octet: u8) {
        self(octet)
    }
}

/// Types whose in-memory representation is checksummed byte for byte.
pub trait Plain: Copy + 'static {
    /// Number of octets in the representation
    const SIZE: usize;

    /// Visit the native octets of the value
    fn for_each_octet<F: FnMut(u8)>(&self, f: F);

    /// Rebuild a value from exactly `SIZE` octets
    fn from_octets(octets: &[u8]) -> Self;
}

/// Checksum, pack and unpack rule for a persisted type.
pub trait Persist: Sized {
    /// Feed the canonical octets of the value to `sink`
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C);

    /// Append the packed representation of the value to `buf`
    fn pack(&self, buf: &mut Vec<u8>);

    /// Read a value back from its packed representation
    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError>;
}

/// Checksum a single plain value
pub fn checksum_plain<T: Plain, C: ChecksumSink + ?Sized>(value: &T, sink: &mut C) {
    value.for_each_octet(|octet| sink.put(octet));
}

/// Checksum a homogeneous array of plain values
pub fn checksum_array<T: Plain, C: ChecksumSink + ?Sized>(values: &[T], sink: &mut C) {
    for value in values {
        checksum_plain(value, sink);
    }
}

/// Pack a single plain value
pub fn pack_plain<T: Plain>(value: &T, buf: &mut Vec<u8>) {
    value.for_each_octet(|octet| buf.push(octet));
}

/// Canonical checksum octets of a value
pub fn checksum_octets<T: Persist>(value: &T) -> Vec<u8> {
    let mut octets = Vec::new();
    value.checksum(&mut |octet| octets.push(octet));
    octets
}

/// Bit exact equality over the packed representation
///
/// Floating point fields compare by bit pattern, so `0.0` and `-0.0` differ and
/// a NaN equals an identical NaN.
pub fn bitwise_eq<T: Persist>(lhs: &T, rhs: &T) -> bool {
    let mut a = Vec::new();
    let mut b = Vec::new();
    lhs.pack(&mut a);
    rhs.pack(&mut b);
    a == b
}

/// Cursor over a packed buffer
#[derive(Debug)]
pub struct Unpacker<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    /// Create a new unpacker reading from the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], SerializationError> {
        if self.remaining() < n {
            return Err(SerializationError::UnexpectedEnd {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a plain value
    pub fn plain<T: Plain>(&mut self) -> Result<T, SerializationError> {
        let octets = self.take(T::SIZE)?;
        Ok(T::from_octets(octets))
    }

    /// Read a length prefix
    pub fn len_prefix(&mut self) -> Result<usize, SerializationError> {
        let len: u64 = self.plain()?;
        usize::try_from(len).map_err(|_| SerializationError::InvalidTag {
            kind: "length",
            value: len as i64,
        })
    }

    /// Fail if anything is left in the buffer
    pub fn finish(self) -> Result<(), SerializationError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SerializationError::TrailingBytes(n)),
        }
    }
}

macro_rules! impl_plain {
    ($($ty:ty),* $(,)?) => {$(
        impl Plain for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn for_each_octet<F: FnMut(u8)>(&self, mut f: F) {
                for octet in self.to_ne_bytes() {
                    f(octet);
                }
            }

            fn from_octets(octets: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(octets);
                <$ty>::from_ne_bytes(raw)
            }
        }

        impl Persist for $ty {
            fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
                checksum_plain(self, sink);
            }

            fn pack(&self, buf: &mut Vec<u8>) {
                pack_plain(self, buf);
            }

            fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
                reader.plain()
            }
        }
    )*};
}

impl_plain!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Plain for bool {
    const SIZE: usize = 1;

    fn for_each_octet<F: FnMut(u8)>(&self, mut f: F) {
        f(u8::from(*self));
    }

    fn from_octets(octets: &[u8]) -> Self {
        octets[0] != 0
    }
}

impl Persist for bool {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_plain(self, sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(self, buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        match reader.plain::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerializationError::InvalidTag {
                kind: "bool",
                value: i64::from(other),
            }),
        }
    }
}

impl<T: Plain, const N: usize> Plain for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn for_each_octet<F: FnMut(u8)>(&self, mut f: F) {
        for value in self {
            value.for_each_octet(&mut f);
        }
    }

    fn from_octets(octets: &[u8]) -> Self {
        std::array::from_fn(|i| T::from_octets(&octets[i * T::SIZE..(i + 1) * T::SIZE]))
    }
}

impl<T: Plain, const N: usize> Persist for [T; N] {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_array(self, sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(self, buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        reader.plain()
    }
}

// Indices are persisted as 64 bit values whatever the host word size.
impl Persist for usize {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_plain(&(*self as u64), sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(&(*self as u64), buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        reader.len_prefix()
    }
}

impl Persist for String {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_array(self.as_bytes(), sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(&(self.len() as u64), buf);
        buf.extend_from_slice(self.as_bytes());
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let len = reader.len_prefix()?;
        let bytes = reader.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("invalid UTF-8 in string: {}", e),
        })
    }
}

impl Persist for DateTime<Utc> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_plain(&self.timestamp(), sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(&self.timestamp(), buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let seconds: i64 = reader.plain()?;
        Utc.timestamp_opt(seconds, 0)
            .single()
            .ok_or(SerializationError::InvalidTag {
                kind: "timestamp",
                value: seconds,
            })
    }
}

impl<T: Persist> Persist for Option<T> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        match self {
            None => sink.put(0),
            Some(value) => {
                sink.put(1);
                value.checksum(sink);
            }
        }
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        match self {
            None => buf.push(0),
            Some(value) => {
                buf.push(1);
                value.pack(buf);
            }
        }
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        match reader.plain::<u8>()? {
            0 => Ok(None),
            1 => Ok(Some(T::unpack(reader)?)),
            other => Err(SerializationError::InvalidTag {
                kind: "option",
                value: i64::from(other),
            }),
        }
    }
}

impl<T: Persist> Persist for Vec<T> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        self.len().checksum(sink);
        for value in self {
            value.checksum(sink);
        }
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        self.len().pack(buf);
        for value in self {
            value.pack(buf);
        }
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let len = reader.len_prefix()?;
        let mut values = Vec::with_capacity(len.min(reader.remaining()));
        for _ in 0..len {
            values.push(T::unpack(reader)?);
        }
        Ok(values)
    }
}

// Maps are traversed in key order so the octet stream does not depend on
// insertion history.
impl<K: Persist + Ord, V: Persist> Persist for BTreeMap<K, V> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        self.len().checksum(sink);
        for (key, value) in self {
            key.checksum(sink);
            value.checksum(sink);
        }
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        self.len().pack(buf);
        for (key, value) in self {
            key.pack(buf);
            value.pack(buf);
        }
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let len = reader.len_prefix()?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::unpack(reader)?;
            let value = V::unpack(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: Persist + Ord> Persist for BTreeSet<T> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        self.len().checksum(sink);
        for value in self {
            value.checksum(sink);
        }
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        self.len().pack(buf);
        for value in self {
            value.pack(buf);
        }
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let len = reader.len_prefix()?;
        let mut set = BTreeSet::new();
        for _ in 0..len {
            set.insert(T::unpack(reader)?);
        }
        Ok(set)
    }
}

impl<T: Persist> Persist for Arc<T> {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        self.as_ref().checksum(sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        self.as_ref().pack(buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        Ok(Arc::new(T::unpack(reader)?))
    }
}

impl<A: Persist, B: Persist> Persist for (A, B) {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        self.0.checksum(sink);
        self.1.checksum(sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        self.0.pack(buf);
        self.1.pack(buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        let a = A::unpack(reader)?;
        let b = B::unpack(reader)?;
        Ok((a, b))
    }
}

/// Declare the persisted field list of a struct.
///
/// The list is the single place that decides checksum, pack and unpack order.
/// Unpacking builds the struct with a literal, so leaving a field out of the
/// list fails to compile.
#[macro_export]
macro_rules! persist_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::checksum::Persist for $ty {
            fn checksum<C: $crate::checksum::ChecksumSink + ?Sized>(&self, sink: &mut C) {
                $( $crate::checksum::Persist::checksum(&self.$field, sink); )+
            }

            fn pack(&self, buf: &mut Vec<u8>) {
                $( $crate::checksum::Persist::pack(&self.$field, buf); )+
            }

            fn unpack(
                reader: &mut $crate::checksum::Unpacker<'_>,
            ) -> Result<Self, $crate::error::SerializationError> {
                Ok(Self {
                    $( $field: $crate::checksum::Persist::unpack(reader)?, )+
                })
            }
        }
    };
}

/// Declare the persisted integer codes of a fieldless enum.
#[macro_export]
macro_rules! persist_enum {
    ($ty:ty { $($variant:ident = $code:expr),+ $(,)? }) => {
        impl $crate::checksum::Persist for $ty {
            fn checksum<C: $crate::checksum::ChecksumSink + ?Sized>(&self, sink: &mut C) {
                let code: i32 = match self { $( Self::$variant => $code, )+ };
                $crate::checksum::checksum_plain(&code, sink);
            }

            fn pack(&self, buf: &mut Vec<u8>) {
                let code: i32 = match self { $( Self::$variant => $code, )+ };
                $crate::checksum::pack_plain(&code, buf);
            }

            fn unpack(
                reader: &mut $crate::checksum::Unpacker<'_>,
            ) -> Result<Self, $crate::error::SerializationError> {
                let code: i32 = reader.plain()?;
                $( if code == $code { return Ok(Self::$variant); } )+
                Err($crate::error::SerializationError::InvalidTag {
                    kind: stringify!($ty),
                    value: i64::from(code),
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Fixture {
        id: i32,
        name: String,
        weight: f64,
        tags: Vec<u16>,
    }

    crate::persist_fields!(Fixture { id, name, weight, tags });

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        On,
        Off,
    }

    crate::persist_enum!(Mode { On = 1, Off = 2 });

    fn fixture() -> Fixture {
        Fixture {
            id: 7,
            name: "P1".to_string(),
            weight: 2.5,
            tags: vec![1, 2],
        }
    }

    fn round_trip<T: Persist>(value: &T) -> T {
        let mut buf = Vec::new();
        value.pack(&mut buf);
        let mut reader = Unpacker::new(&buf);
        let back = T::unpack(&mut reader).unwrap();
        reader.finish().unwrap();
        back
    }

    #[test]
    fn test_plain_value_uses_native_octets() {
        let value: i32 = 0x0102_0304;
        assert_eq!(checksum_octets(&value), value.to_ne_bytes().to_vec());

        let value = 1.5f64;
        assert_eq!(checksum_octets(&value), value.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_closure_sink_sees_every_octet() {
        let mut count = 0usize;
        let mut sink = |_octet: u8| count += 1;
        checksum_array(&[1u32, 2, 3], &mut sink);
        assert_eq!(count, 12);
    }

    #[test]
    fn test_string_checksums_content_only() {
        let value = "ABC".to_string();
        assert_eq!(checksum_octets(&value), b"ABC".to_vec());
    }

    #[test]
    fn test_time_checksums_seconds() {
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(checksum_octets(&time), time.timestamp().to_ne_bytes().to_vec());
        assert_eq!(round_trip(&time), time);
    }

    #[test]
    fn test_struct_field_order() {
        let p = fixture();
        let mut expected = Vec::new();
        expected.extend_from_slice(&7i32.to_ne_bytes());
        expected.extend_from_slice(b"P1");
        expected.extend_from_slice(&2.5f64.to_ne_bytes());
        expected.extend_from_slice(&2u64.to_ne_bytes());
        expected.extend_from_slice(&1u16.to_ne_bytes());
        expected.extend_from_slice(&2u16.to_ne_bytes());
        assert_eq!(checksum_octets(&p), expected);
    }

    #[test]
    fn test_round_trips() {
        assert_eq!(round_trip(&fixture()), fixture());
        assert_eq!(round_trip(&Some(Mode::Off)), Some(Mode::Off));
        assert_eq!(round_trip(&[1.0f64, -2.0, 3.5]), [1.0f64, -2.0, 3.5]);

        let mut map = BTreeMap::new();
        map.insert("B".to_string(), Arc::new(fixture()));
        map.insert("A".to_string(), Arc::new(fixture()));
        assert_eq!(round_trip(&map), map);
    }

    #[test]
    fn test_bitwise_eq_distinguishes_signed_zero() {
        let mut a = fixture();
        let mut b = fixture();
        a.weight = 0.0;
        b.weight = -0.0;
        assert_eq!(a, b);
        assert!(!bitwise_eq(&a, &b));
    }

    #[test]
    fn test_bad_enum_code_rejected() {
        let mut buf = Vec::new();
        pack_plain(&9i32, &mut buf);
        let result = Mode::unpack(&mut Unpacker::new(&buf));
        assert!(matches!(
            result,
            Err(SerializationError::InvalidTag { value: 9, .. })
        ));
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let mut buf = Vec::new();
        fixture().pack(&mut buf);
        buf.truncate(buf.len() - 1);
        let result = Fixture::unpack(&mut Unpacker::new(&buf));
        assert!(matches!(result, Err(SerializationError::UnexpectedEnd { .. })));
    }
}
