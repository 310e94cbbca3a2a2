use crate::artifacts::analyzer::name_table::NameTable;
use crate::artifacts::analyzer::package_header::TableSpan;
use crate::artifacts::analyzer::reference_scan::normalize_reference;
use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

pub const IMPORT_RECORD_LEN: usize = 28;

/// Engine-internal packages; imports from here are never asset dependencies.
const SCRIPT_ROOT: &str = "/Script/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub class_package: String,
    pub class_name: String,
    pub outer_index: i32,
    pub object_name: String,
}

impl ImportRecord {
    /// Package path this import depends on, when it names a content asset.
    pub fn asset_reference(&self) -> Option<String> {
        [&self.object_name, &self.class_package]
            .into_iter()
            .filter(|name| !name.starts_with(SCRIPT_ROOT))
            .find_map(|name| normalize_reference(name))
    }
}

/// Parse the import table, dropping records that reference unknown names.
pub fn parse_imports(bytes: &[u8], span: TableSpan, names: &NameTable) -> Vec<ImportRecord> {
    let mut imports = Vec::with_capacity(span.count.min(bytes.len() / IMPORT_RECORD_LEN));

    for index in 0..span.count {
        let start = span.offset + index * IMPORT_RECORD_LEN;
        let Some(record) = bytes.get(start..start + IMPORT_RECORD_LEN) else {
            debug!(index, "import table truncated");
            break;
        };

        let field = |n: usize| LittleEndian::read_i32(&record[n * 4..n * 4 + 4]);
        let resolved = (
            names.get(field(0)),
            names.get(field(2)),
            names.get(field(5)),
        );

        match resolved {
            (Some(class_package), Some(class_name), Some(object_name)) => imports.push(ImportRecord {
                class_package: class_package.to_string(),
                class_name: class_name.to_string(),
                outer_index: field(4),
                object_name: object_name.to_string(),
            }),
            _ => debug!(index, "skipping import with unresolved name index"),
        }
    }

    imports
}
