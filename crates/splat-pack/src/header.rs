use crate::error::ConvertError;
use crate::schema::NumericKind;

/// Only this many leading bytes are searched for the header.
pub const HEADER_SCAN_LIMIT: usize = 10 * 1024;

pub const HEADER_END: &[u8] = b"end_header\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: NumericKind,
}

#[derive(Debug, Clone)]
pub struct PlyHeader {
    /// Offset of the first byte after `end_header\n`.
    pub body_offset: usize,
    pub vertex_count: usize,
    pub properties: Vec<Property>,
    pub format: Option<String>,
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_vertex_count(line: &str) -> Option<Result<usize, ConvertError>> {
    let count = line.strip_prefix("element vertex ")?;
    // Plain digits only, `parse` would also take a sign.
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Some(Err(ConvertError::header(format!(
            "Invalid vertex count '{count}'"
        ))));
    }
    Some(count.parse::<usize>().map_err(|e| {
        ConvertError::header(format!("Invalid vertex count '{count}': {e}"))
    }))
}

fn parse_property(line: &str) -> Option<Result<Property, ConvertError>> {
    let rest = line.strip_prefix("property ")?;
    let mut parts = rest.split_ascii_whitespace();

    let (Some(type_token), Some(name)) = (parts.next(), parts.next()) else {
        return Some(Err(ConvertError::header(format!(
            "Malformed property line '{line}'"
        ))));
    };

    Some(Ok(Property {
        name: name.to_owned(),
        kind: NumericKind::from_token(type_token),
    }))
}

impl PlyHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ConvertError> {
        let _span = tracing::trace_span!("Parse header").entered();

        let prefix = &data[..data.len().min(HEADER_SCAN_LIMIT)];
        let header_end = find_subslice(prefix, HEADER_END).ok_or_else(|| {
            ConvertError::header(format!(
                "no end_header found in the first {HEADER_SCAN_LIMIT} bytes"
            ))
        })?;
        let text = String::from_utf8_lossy(&prefix[..header_end]);

        let mut vertex_count = None;
        let mut properties = vec![];
        let mut format = None;

        for line in text.lines() {
            if vertex_count.is_none()
                && let Some(count) = parse_vertex_count(line)
            {
                vertex_count = Some(count?);
            } else if let Some(property) = parse_property(line) {
                properties.push(property?);
            } else if let Some(declared) = line.strip_prefix("format ") {
                format = declared.split_ascii_whitespace().next().map(str::to_owned);
            }
        }

        let vertex_count = vertex_count
            .ok_or_else(|| ConvertError::header("missing 'element vertex' declaration"))?;

        if let Some(format) = &format
            && format != "binary_little_endian"
        {
            log::warn!("Ply declares format '{format}', reading body as binary little endian");
        }

        Ok(Self {
            body_offset: header_end + HEADER_END.len(),
            vertex_count,
            properties,
            format,
        })
    }
}
