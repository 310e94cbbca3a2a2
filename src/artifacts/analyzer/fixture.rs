use crate::artifacts::analyzer::package_header::{HEADER_LEN, PackageSummary};
use byteorder::{LittleEndian, WriteBytesExt};

enum NameEntry {
    Text(String),
    Raw { len: i32, payload: Vec<u8> },
}

/// Builds package buffers for analyzer tests.
#[derive(Default)]
pub struct PackageFixture {
    names: Vec<NameEntry>,
    imports: Vec<[i32; 7]>,
    trailer: Vec<u8>,
    name_offset: Option<i32>,
    import_count: Option<i32>,
}

impl PackageFixture {
    pub fn with_names<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.names
            .extend(names.into_iter().map(|name| NameEntry::Text(name.to_string())));
        self
    }

    /// Append a name entry with an arbitrary length field and payload.
    pub fn with_raw_name(mut self, len: i32, payload: &[u8]) -> Self {
        self.names.push(NameEntry::Raw {
            len,
            payload: payload.to_vec(),
        });
        self
    }

    /// Append an import whose class package, class name and object name are name-table indices.
    pub fn with_import(mut self, class_package: i32, class_name: i32, object_name: i32) -> Self {
        self.imports
            .push([class_package, 0, class_name, 0, 0, object_name, 0]);
        self
    }

    pub fn with_trailer(mut self, trailer: &[u8]) -> Self {
        self.trailer.extend_from_slice(trailer);
        self
    }

    pub fn with_name_offset(mut self, offset: i32) -> Self {
        self.name_offset = Some(offset);
        self
    }

    pub fn with_import_count(mut self, count: i32) -> Self {
        self.import_count = Some(count);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut tables = Vec::new();

        for entry in &self.names {
            match entry {
                NameEntry::Text(name) => {
                    tables.write_i32::<LittleEndian>(name.len() as i32 + 1).unwrap();
                    tables.extend_from_slice(name.as_bytes());
                    tables.push(0);
                }
                NameEntry::Raw { len, payload } => {
                    tables.write_i32::<LittleEndian>(*len).unwrap();
                    tables.extend_from_slice(payload);
                }
            }
            tables.write_u32::<LittleEndian>(0xdead_beef).unwrap();
        }

        let import_offset = HEADER_LEN + tables.len();
        for import in &self.imports {
            for field in import {
                tables.write_i32::<LittleEndian>(*field).unwrap();
            }
        }

        let summary = PackageSummary {
            legacy_version: -8,
            file_version: 522,
            licensee_version: 0,
            total_header_size: (HEADER_LEN + tables.len()) as i32,
            name_count: self.names.len() as i32,
            name_offset: self.name_offset.unwrap_or(HEADER_LEN as i32),
            import_count: self.import_count.unwrap_or(self.imports.len() as i32),
            import_offset: import_offset as i32,
            export_count: 0,
            export_offset: 0,
        };

        let mut bytes = summary.to_bytes().to_vec();
        bytes.extend_from_slice(&tables);
        bytes.extend_from_slice(&self.trailer);
        bytes
    }
}
