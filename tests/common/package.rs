use byteorder::{LittleEndian, WriteBytesExt};

pub const PACKAGE_MAGIC: u32 = 0x9E2A_83C1;
pub const HEADER_LEN: usize = 44;

/// Builds engine package buffers: header, name table, import table.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    names: Vec<String>,
    imports: Vec<[i32; 7]>,
    name_offset: Option<i32>,
}

impl PackageBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.names.push(name.to_string());
        self
    }

    /// Add an import of `/Game/...` package `target`, adding its names as needed.
    pub fn import(mut self, target: &str) -> Self {
        let class_package = self.intern("/Script/CoreUObject");
        let class_name = self.intern("Package");
        let object_name = self.intern(target);
        self.imports
            .push([class_package, 0, class_name, 0, 0, object_name, 0]);
        self
    }

    pub fn name_offset(mut self, offset: i32) -> Self {
        self.name_offset = Some(offset);
        self
    }

    fn intern(&mut self, name: &str) -> i32 {
        let index = match self.names.iter().position(|existing| existing == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        };
        index as i32
    }

    pub fn build(self) -> Vec<u8> {
        let mut tables = Vec::new();
        for name in &self.names {
            tables.write_i32::<LittleEndian>(name.len() as i32 + 1).unwrap();
            tables.extend_from_slice(name.as_bytes());
            tables.push(0);
            tables.write_u32::<LittleEndian>(0).unwrap();
        }

        let import_offset = HEADER_LEN + tables.len();
        for import in &self.imports {
            for field in import {
                tables.write_i32::<LittleEndian>(*field).unwrap();
            }
        }

        let mut bytes = Vec::with_capacity(HEADER_LEN + tables.len());
        bytes.write_u32::<LittleEndian>(PACKAGE_MAGIC).unwrap();
        for field in [
            -8,
            522,
            0,
            (HEADER_LEN + tables.len()) as i32,
            self.names.len() as i32,
            self.name_offset.unwrap_or(HEADER_LEN as i32),
            self.imports.len() as i32,
            import_offset as i32,
            0,
            0,
        ] {
            bytes.write_i32::<LittleEndian>(field).unwrap();
        }
        bytes.extend_from_slice(&tables);
        bytes
    }
}
