use crate::error::ConvertError;
use crate::schema::{Field, Schema};

/// The binary rows following a ply header.
#[derive(Clone, Copy)]
pub struct VertexRows<'a> {
    schema: &'a Schema,
    body: &'a [u8],
    count: usize,
}

impl<'a> VertexRows<'a> {
    /// `body` starts right after `end_header\n`. Fails when it can't hold `count` rows.
    pub fn new(schema: &'a Schema, body: &'a [u8], count: usize) -> Result<Self, ConvertError> {
        let needed = schema
            .stride()
            .checked_mul(count)
            .ok_or(ConvertError::Truncated {
                needed: usize::MAX,
                available: body.len(),
            })?;
        if needed > body.len() {
            return Err(ConvertError::Truncated {
                needed,
                available: body.len(),
            });
        }
        Ok(Self {
            schema,
            body,
            count,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn row(&self, index: usize) -> VertexRow<'a> {
        assert!(index < self.count, "Row {index} out of bounds ({})", self.count);
        VertexRow { rows: *self, index }
    }
}

/// A single row. Nothing is decoded until a value is asked for.
#[derive(Clone, Copy)]
pub struct VertexRow<'a> {
    rows: VertexRows<'a>,
    index: usize,
}

impl VertexRow<'_> {
    pub fn read(&self, field: Field) -> f64 {
        let start = self.index * self.rows.schema.stride() + field.offset;
        field.kind.decode(&self.rows.body[start..start + field.kind.width()])
    }

    pub fn read_f32(&self, field: Field) -> f32 {
        self.read(field) as f32
    }

    pub fn get(&self, name: &str) -> Result<f64, ConvertError> {
        Ok(self.read(self.rows.schema.require(name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PlyHeader;

    fn schema() -> Schema {
        let header = PlyHeader::parse(
            b"ply\nelement vertex 2\nproperty float x\nproperty uchar red\nproperty short s\nend_header\n",
        )
        .unwrap();
        Schema::from_header(&header)
    }

    fn body() -> Vec<u8> {
        let mut body = vec![];
        for (x, red, s) in [(1.5f32, 10u8, -3i16), (-4.0, 250, 1000)] {
            body.extend(x.to_le_bytes());
            body.push(red);
            body.extend(s.to_le_bytes());
        }
        body
    }

    #[test]
    fn reads_values_per_row() {
        let schema = schema();
        let body = body();
        let rows = VertexRows::new(&schema, &body, 2).unwrap();

        let row = rows.row(1);
        assert_eq!(row.get("x").unwrap(), -4.0);
        assert_eq!(row.get("red").unwrap(), 250.0);
        assert_eq!(row.get("s").unwrap(), 1000.0);
        assert_eq!(rows.row(0).get("s").unwrap(), -3.0);
    }

    #[test]
    fn missing_name_is_reported() {
        let schema = schema();
        let body = body();
        let rows = VertexRows::new(&schema, &body, 2).unwrap();
        let err = rows.row(0).get("opacity").unwrap_err();
        assert!(matches!(err, ConvertError::PropertyNotFound(ref n) if n == "opacity"));
    }

    #[test]
    fn short_body_is_truncated() {
        let schema = schema();
        let body = body();
        let result = VertexRows::new(&schema, &body[..body.len() - 1], 2);
        assert!(matches!(
            result,
            Err(ConvertError::Truncated {
                needed: 14,
                available: 13
            })
        ));
    }

    #[test]
    fn trailing_bytes_are_allowed() {
        let schema = schema();
        let mut body = body();
        body.extend([0; 5]);
        let rows = VertexRows::new(&schema, &body, 2).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
