use crate::error::{Result, TilingError};
use num_traits::NumCast;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    UInt8,
    UInt16,
    Int16,
    UInt32,
    #[default]
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    pub const ALL: [PixelType; 7] = [
        PixelType::UInt8,
        PixelType::UInt16,
        PixelType::Int16,
        PixelType::UInt32,
        PixelType::Int32,
        PixelType::Float32,
        PixelType::Float64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PixelType::UInt8 => "uint8",
            PixelType::UInt16 => "uint16",
            PixelType::Int16 => "int16",
            PixelType::UInt32 => "uint32",
            PixelType::Int32 => "int32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    /// Convert a value to the concrete element type of this pixel type.
    /// Integer types round to the nearest integer (half away from zero), as
    /// GDAL does when copying floats into integer bands, and reject NaN,
    /// infinities and values whose rounded form is outside their range.
    pub fn cast<T: NumCast>(self, value: f64) -> Result<T> {
        let rounded = if self.is_integer() { value.round() } else { value };
        num_traits::cast::<f64, T>(rounded).ok_or(TilingError::PixelValueOutOfRange {
            value,
            pixel_type: self,
        })
    }

    /// Value as it reads back after being stored with this pixel type.
    pub fn quantize(self, value: f64) -> Result<f64> {
        let stored = match self {
            PixelType::UInt8 => self.cast::<u8>(value)? as f64,
            PixelType::UInt16 => self.cast::<u16>(value)? as f64,
            PixelType::Int16 => self.cast::<i16>(value)? as f64,
            PixelType::UInt32 => self.cast::<u32>(value)? as f64,
            PixelType::Int32 => self.cast::<i32>(value)? as f64,
            PixelType::Float32 => value as f32 as f64,
            PixelType::Float64 => value,
        };
        Ok(stored)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = TilingError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        PixelType::ALL
            .into_iter()
            .find(|pt| pt.name() == lower)
            .or(match lower.as_str() {
                "byte" => Some(PixelType::UInt8),
                _ => None,
            })
            .ok_or_else(|| TilingError::UnknownPixelType(s.to_string()))
    }
}

/// Bidirectional mapping between [`PixelType`] and a backend's native type
/// codes. Backends build one at construction and never expose their codes
/// to the rest of the crate.
#[derive(Debug, Clone)]
pub struct PixelTypeTable<C> {
    entries: Vec<(PixelType, C)>,
}

impl<C: Copy + PartialEq + fmt::Debug> PixelTypeTable<C> {
    pub fn new(entries: impl IntoIterator<Item = (PixelType, C)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn code(&self, pixel_type: PixelType) -> Result<C> {
        self.entries
            .iter()
            .find(|(pt, _)| *pt == pixel_type)
            .map(|(_, code)| *code)
            .ok_or_else(|| TilingError::UnmappedPixelType(pixel_type.to_string()))
    }

    pub fn pixel_type(&self, code: C) -> Result<PixelType> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(pt, _)| *pt)
            .ok_or_else(|| TilingError::UnmappedPixelType(format!("{:?}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("uint8".parse::<PixelType>().unwrap(), PixelType::UInt8);
        assert_eq!("Byte".parse::<PixelType>().unwrap(), PixelType::UInt8);
        assert_eq!("FLOAT32".parse::<PixelType>().unwrap(), PixelType::Float32);
        assert!("complex64".parse::<PixelType>().is_err());
    }

    #[test]
    fn test_default_is_int32() {
        assert_eq!(PixelType::default(), PixelType::Int32);
    }

    #[test]
    fn test_cast_range() {
        assert_eq!(PixelType::UInt8.cast::<u8>(255.0).unwrap(), 255);
        assert!(PixelType::UInt8.cast::<u8>(256.0).is_err());
        assert!(PixelType::UInt16.cast::<u16>(-1.0).is_err());
        assert!(PixelType::Int32.cast::<i32>(f64::NAN).is_err());
        assert_eq!(PixelType::Int16.cast::<i16>(-12.7).unwrap(), -13);
        assert_eq!(PixelType::UInt8.cast::<u8>(255.4).unwrap(), 255);
        assert!(PixelType::UInt8.cast::<u8>(255.5).is_err());
        assert_eq!(PixelType::UInt16.cast::<u16>(-0.4).unwrap(), 0);
        assert_eq!(PixelType::Float32.cast::<f32>(2.75).unwrap(), 2.75);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(PixelType::Int32.quantize(3.9).unwrap(), 4.0);
        assert_eq!(PixelType::Int32.quantize(7.6).unwrap(), 8.0);
        assert_eq!(PixelType::Int32.quantize(-7.6).unwrap(), -8.0);
        assert_eq!(PixelType::Int16.quantize(2.5).unwrap(), 3.0);
        assert_eq!(PixelType::UInt32.quantize(7.4).unwrap(), 7.0);
        assert_eq!(PixelType::Float64.quantize(0.1).unwrap(), 0.1);
        assert_eq!(PixelType::Float32.quantize(0.5).unwrap(), 0.5);
        assert!(PixelType::UInt8.quantize(-0.5 - 1.0).is_err());
    }

    #[test]
    fn test_table_lookup_both_ways() {
        let table = PixelTypeTable::new([(PixelType::UInt8, 1u32), (PixelType::Float32, 6u32)]);
        assert_eq!(table.code(PixelType::Float32).unwrap(), 6);
        assert_eq!(table.pixel_type(1).unwrap(), PixelType::UInt8);
        assert!(table.code(PixelType::Int16).is_err());
        assert!(table.pixel_type(42).is_err());
    }
}
