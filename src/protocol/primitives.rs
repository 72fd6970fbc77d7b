//! Wire primitive types and their argument encodings.
//!
//! | Rust type       | Wire argument | Static |
//! |-----------------|---------------|--------|
//! | `i32`           | int           | yes    |
//! | `u32`           | uint          | yes    |
//! | [`Fixed`]       | fixed         | yes    |
//! | `ObjectId<I>`   | object        | yes    |
//! | `NewId<I>`      | new_id        | yes    |
//! | `String`        | string        | no     |
//! | `Bytes`         | array         | no     |
//! | `OwnedFd`       | fd            | no     |

use std::fmt;
use std::os::fd::OwnedFd;

use bytes::Bytes;

use super::message::{ArgReader, ArgWriter, WireArg};
use super::object_id::{NewId, ObjectId};
use crate::error::Result;

/// Signed 24.8 fixed-point number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Fixed(i32);

impl Fixed {
    /// Wrap the raw wire value.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Exact conversion from an integer in the 24-bit range.
    pub const fn from_int(value: i32) -> Self {
        Self(value << 8)
    }

    /// Nearest representable value.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 256.0).round() as i32)
    }

    /// Exact conversion to floating point.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 256.0
    }

    /// Integer part, rounded toward negative infinity.
    pub const fn to_int(self) -> i32 {
        self.0 >> 8
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

impl WireArg for i32 {
    const STATIC_SIZE: Option<usize> = Some(4);

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_i32(self);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_i32()
    }
}

impl WireArg for u32 {
    const STATIC_SIZE: Option<usize> = Some(4);

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_u32(self);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_u32()
    }
}

impl WireArg for Fixed {
    const STATIC_SIZE: Option<usize> = Some(4);

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_i32(self.0);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_i32().map(Fixed)
    }
}

impl<I> WireArg for ObjectId<I> {
    const STATIC_SIZE: Option<usize> = Some(4);

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_u32(self.id());
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_u32().map(ObjectId::from_raw)
    }
}

impl<I> WireArg for NewId<I> {
    const STATIC_SIZE: Option<usize> = Some(4);

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_u32(self.id());
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_u32().map(NewId::from_raw)
    }
}

impl WireArg for String {
    const STATIC_SIZE: Option<usize> = None;

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_string(&self);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_string().map(str::to_owned)
    }
}

impl WireArg for Bytes {
    const STATIC_SIZE: Option<usize> = None;

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.put_array(&self);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_array().map(Bytes::copy_from_slice)
    }
}

impl WireArg for OwnedFd {
    const STATIC_SIZE: Option<usize> = None;

    fn encode(self, out: &mut ArgWriter<'_>) {
        out.push_fd(self);
    }

    fn decode(args: &mut ArgReader<'_>) -> Result<Self> {
        args.take_fd()
    }
}
