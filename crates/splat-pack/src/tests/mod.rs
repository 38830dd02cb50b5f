
/// Builds small binary little endian ply files by hand.
pub(crate) struct TestPly {
    properties: Vec<(&'static str, &'static str)>,
    rows: Vec<Vec<f64>>,
}

impl TestPly {
    pub(crate) fn new(properties: &[(&'static str, &'static str)]) -> Self {
        Self {
            properties: properties.to_vec(),
            rows: vec![],
        }
    }

    /// All properties as floats.
    pub(crate) fn floats(names: &[&'static str]) -> Self {
        Self::new(&names.iter().map(|&n| ("float", n)).collect::<Vec<_>>())
    }

    pub(crate) fn row(mut self, values: &[f64]) -> Self {
        assert_eq!(values.len(), self.properties.len(), "Row length mismatch");
        self.rows.push(values.to_vec());
        self
    }

    pub(crate) fn header(&self) -> String {
        let mut header = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex {}\n",
            self.rows.len()
        );
        for (ty, name) in &self.properties {
            header.push_str(&format!("property {ty} {name}\n"));
        }
        header.push_str("end_header\n");
        header
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut data = self.header().into_bytes();
        for row in &self.rows {
            for (&(ty, _), &value) in self.properties.iter().zip(row) {
                match ty {
                    "double" => data.extend(value.to_le_bytes()),
                    "float" => data.extend((value as f32).to_le_bytes()),
                    "int" => data.extend((value as i32).to_le_bytes()),
                    "uint" => data.extend((value as u32).to_le_bytes()),
                    "short" => data.extend((value as i16).to_le_bytes()),
                    "ushort" => data.extend((value as u16).to_le_bytes()),
                    "uchar" => data.push(value as u8),
                    _ => data.push(value as i8 as u8),
                }
            }
        }
        data
    }
}

pub(crate) const GAUSSIAN_PROPS: [&str; 11] = [
    "x", "y", "z", "scale_0", "scale_1", "scale_2", "opacity", "rot_0", "rot_1", "rot_2", "rot_3",
];
