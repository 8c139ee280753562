//! Element kinds storable in a strided array.
//!
//! The set is closed: the eight integer kinds plus `f32`/`f64`. Each kind
//! carries a widened accumulator type so summation cannot overflow for
//! integers and loses nothing beyond rounding for floats.

use std::fmt;

use num_traits::Zero;

mod sealed {
    pub trait Sealed {}
}

/// Runtime tag for the element kind of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// Size of one element in bytes.
    pub const fn size_of(self) -> usize {
        match self {
            DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric kinds a strided container can hold.
///
/// Sealed: the closed set above is part of the API contract. `Accum` is the
/// type reductions accumulate in, 64 bits or wider for every kind: `f64` for
/// the floats, `i64`/`u64` for the narrow integers, and `i128`/`u128` for the
/// 64-bit integers so a full-length sum stays exact.
pub trait Element:
    sealed::Sealed + Copy + PartialEq + fmt::Debug + Zero + Send + Sync + 'static
{
    /// Runtime tag for this kind.
    const DTYPE: DType;

    /// Widened accumulator type.
    type Accum: Copy + PartialEq + fmt::Debug + Zero + Send + Sync + 'static;

    /// Widen a single element for accumulation.
    fn widen(self) -> Self::Accum;

    /// Convert a finished accumulator to `f64` for the final division.
    fn accum_to_f64(acc: Self::Accum) -> f64;
}

macro_rules! impl_element {
    ($($t:ty => $tag:ident, $accum:ty;)*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const DTYPE: DType = DType::$tag;

                type Accum = $accum;

                #[inline(always)]
                fn widen(self) -> $accum {
                    self as $accum
                }

                #[inline(always)]
                fn accum_to_f64(acc: $accum) -> f64 {
                    acc as f64
                }
            }
        )*
    };
}

impl_element! {
    i8 => Int8, i64;
    i16 => Int16, i64;
    i32 => Int32, i64;
    i64 => Int64, i128;
    u8 => UInt8, u64;
    u16 => UInt16, u64;
    u32 => UInt32, u64;
    u64 => UInt64, u128;
    f32 => Float32, f64;
    f64 => Float64, f64;
}
