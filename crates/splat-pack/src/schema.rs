use std::collections::HashMap;

use crate::error::ConvertError;
use crate::header::PlyHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Float64,
    Int32,
    UInt32,
    Float32,
    Int16,
    UInt16,
    UInt8,
    /// Fallback for any type token we don't recognize.
    Int8,
}

impl NumericKind {
    pub fn from_token(token: &str) -> Self {
        match token {
            "double" => Self::Float64,
            "int" => Self::Int32,
            "uint" => Self::UInt32,
            "float" => Self::Float32,
            "short" => Self::Int16,
            "ushort" => Self::UInt16,
            "uchar" => Self::UInt8,
            _ => Self::Int8,
        }
    }

    pub const fn width(self) -> usize {
        match self {
            Self::Float64 => 8,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int16 | Self::UInt16 => 2,
            Self::UInt8 | Self::Int8 => 1,
        }
    }

    /// Decode a little endian value of this kind from the start of `bytes`.
    ///
    /// Panics if `bytes` is shorter than [`Self::width`].
    pub fn decode(self, bytes: &[u8]) -> f64 {
        fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
            let mut out = [0; N];
            out.copy_from_slice(&bytes[..N]);
            out
        }

        match self {
            Self::Float64 => f64::from_le_bytes(le(bytes)),
            Self::Int32 => f64::from(i32::from_le_bytes(le(bytes))),
            Self::UInt32 => f64::from(u32::from_le_bytes(le(bytes))),
            Self::Float32 => f64::from(f32::from_le_bytes(le(bytes))),
            Self::Int16 => f64::from(i16::from_le_bytes(le(bytes))),
            Self::UInt16 => f64::from(u16::from_le_bytes(le(bytes))),
            Self::UInt8 => f64::from(bytes[0]),
            Self::Int8 => f64::from(i8::from_le_bytes(le(bytes))),
        }
    }
}

/// A resolved property: where it lives in a row and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub kind: NumericKind,
}

#[derive(Debug, Clone)]
pub struct Schema {
    fields: HashMap<String, Field>,
    stride: usize,
}

impl Schema {
    pub fn from_header(header: &PlyHeader) -> Self {
        let mut fields = HashMap::with_capacity(header.properties.len());
        let mut stride = 0;

        for prop in &header.properties {
            // A repeated name still takes up space in the row, the last one wins the lookup.
            fields.insert(
                prop.name.clone(),
                Field {
                    offset: stride,
                    kind: prop.kind,
                },
            );
            stride += prop.kind.width();
        }

        Self { fields, stride }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.fields.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<Field, ConvertError> {
        self.field(name)
            .ok_or_else(|| ConvertError::PropertyNotFound(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn require_all<const N: usize>(&self, names: [&str; N]) -> Result<[Field; N], ConvertError> {
        let mut fields = [Field {
            offset: 0,
            kind: NumericKind::Int8,
        }; N];
        for (field, name) in fields.iter_mut().zip(names) {
            *field = self.require(name)?;
        }
        Ok(fields)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScaleRotationFields {
    pub log_scale: [Field; 3],
    pub rotation: [Field; 4],
}

#[derive(Debug, Clone, Copy)]
pub enum ColorFields {
    /// Degree zero spherical harmonic coefficients.
    ShDc([Field; 3]),
    /// Plain 0-255 colors. Missing channels read as 0.
    Rgb([Option<Field>; 3]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    ShDc,
    Rgb,
}

/// Which splat attributes a file provides, resolved once per file.
///
/// Each optional group is gated on one probe field. Once a group is present
/// the rest of its fields are required.
#[derive(Debug, Clone, Copy)]
pub struct SplatLayout {
    pub position: [Field; 3],
    /// Gated on `scale_0`. Rotations are only read when scales are present too.
    pub scale_rotation: Option<ScaleRotationFields>,
    pub color: ColorFields,
    pub opacity: Option<Field>,
}

impl SplatLayout {
    pub fn resolve(schema: &Schema) -> Result<Self, ConvertError> {
        let position = schema.require_all(["x", "y", "z"])?;

        let scale_rotation = if schema.contains("scale_0") {
            Some(ScaleRotationFields {
                log_scale: schema.require_all(["scale_0", "scale_1", "scale_2"])?,
                rotation: schema.require_all(["rot_0", "rot_1", "rot_2", "rot_3"])?,
            })
        } else {
            if schema.contains("rot_0") {
                log::warn!("Ply has rotations but no scales, rotations will be ignored");
            }
            None
        };

        let color = if schema.contains("f_dc_0") {
            ColorFields::ShDc(schema.require_all(["f_dc_0", "f_dc_1", "f_dc_2"])?)
        } else {
            let rgb = ["red", "green", "blue"].map(|name| schema.field(name));
            if rgb.iter().any(Option::is_none) {
                log::warn!("Ply has no (complete) colors, missing channels will be black");
            }
            ColorFields::Rgb(rgb)
        };

        Ok(Self {
            position,
            scale_rotation,
            color,
            opacity: schema.field("opacity"),
        })
    }

    pub fn color_source(&self) -> ColorSource {
        match self.color {
            ColorFields::ShDc(_) => ColorSource::ShDc,
            ColorFields::Rgb(_) => ColorSource::Rgb,
        }
    }
}
