//! Package summary header
//!
//! Every header-bearing package starts with a fixed 44-byte little-endian
//! summary: the magic tag, four version/size fields, then `(count, offset)`
//! pairs for the name, import and export tables.

use crate::errors::AnalyzerError;
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

pub const PACKAGE_MAGIC: u32 = 0x9E2A_83C1;
pub const HEADER_LEN: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub legacy_version: i32,
    pub file_version: i32,
    pub licensee_version: i32,
    pub total_header_size: i32,
    pub name_count: i32,
    pub name_offset: i32,
    pub import_count: i32,
    pub import_offset: i32,
    pub export_count: i32,
    pub export_offset: i32,
}

/// Validated `(offset, count)` of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpan {
    pub offset: usize,
    pub count: usize,
}

impl PackageSummary {
    pub fn parse(bytes: &[u8]) -> Result<Self, AnalyzerError> {
        if bytes.len() < HEADER_LEN {
            return Err(AnalyzerError::InvalidHeader {
                reason: format!("{} bytes is shorter than the {HEADER_LEN}-byte header", bytes.len()),
            });
        }

        let magic = LittleEndian::read_u32(&bytes[0..4]);
        if magic != PACKAGE_MAGIC {
            return Err(AnalyzerError::InvalidHeader {
                reason: format!("magic {magic:#010x} does not match {PACKAGE_MAGIC:#010x}"),
            });
        }

        let field = |offset: usize| LittleEndian::read_i32(&bytes[offset..offset + 4]);
        let summary = PackageSummary {
            legacy_version: field(4),
            file_version: field(8),
            licensee_version: field(12),
            total_header_size: field(16),
            name_count: field(20),
            name_offset: field(24),
            import_count: field(28),
            import_offset: field(32),
            export_count: field(36),
            export_offset: field(40),
        };

        summary.names(bytes.len())?;
        summary.imports(bytes.len())?;
        summary.exports(bytes.len())?;

        Ok(summary)
    }

    pub fn names(&self, len: usize) -> Result<TableSpan, AnalyzerError> {
        Self::span("name", self.name_count, self.name_offset, len)
    }

    pub fn imports(&self, len: usize) -> Result<TableSpan, AnalyzerError> {
        Self::span("import", self.import_count, self.import_offset, len)
    }

    pub fn exports(&self, len: usize) -> Result<TableSpan, AnalyzerError> {
        Self::span("export", self.export_count, self.export_offset, len)
    }

    fn span(table: &'static str, count: i32, offset: i32, len: usize) -> Result<TableSpan, AnalyzerError> {
        let out_of_bounds = || AnalyzerError::TableOutOfBounds {
            table,
            offset: i64::from(offset),
            len,
        };

        let (Ok(count), Ok(offset)) = (usize::try_from(count), usize::try_from(offset)) else {
            return Err(out_of_bounds());
        };
        if count > 0 && offset >= len {
            return Err(out_of_bounds());
        }

        Ok(TableSpan { offset, count })
    }

    /// Encode back to the 44-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut header[0..4], PACKAGE_MAGIC);
        let fields = [
            self.legacy_version,
            self.file_version,
            self.licensee_version,
            self.total_header_size,
            self.name_count,
            self.name_offset,
            self.import_count,
            self.import_offset,
            self.export_count,
            self.export_offset,
        ];
        LittleEndian::write_i32_into(&fields, &mut header[4..]);
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::analyzer::fixture::PackageFixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn wrong_magic_is_an_invalid_header() {
        let mut bytes = PackageFixture::default().with_names(["Hero"]).build();
        bytes[0] ^= 0xff;

        assert!(matches!(
            PackageSummary::parse(&bytes),
            Err(AnalyzerError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn truncated_buffer_is_an_invalid_header() {
        let bytes = PackageFixture::default().build();
        assert!(matches!(
            PackageSummary::parse(&bytes[..20]),
            Err(AnalyzerError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn name_offset_past_the_end_is_rejected() {
        let bytes = PackageFixture::default()
            .with_names(["Hero"])
            .with_name_offset(10_000)
            .build();

        assert_eq!(
            PackageSummary::parse(&bytes),
            Err(AnalyzerError::TableOutOfBounds {
                table: "name",
                offset: 10_000,
                len: bytes.len(),
            })
        );
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = PackageFixture::default().with_import_count(-1).build();
        assert!(matches!(
            PackageSummary::parse(&bytes),
            Err(AnalyzerError::TableOutOfBounds { table: "import", .. })
        ));
    }

    #[test]
    fn empty_tables_may_point_anywhere() {
        let bytes = PackageFixture::default().build();
        let summary = PackageSummary::parse(&bytes).unwrap();
        assert_eq!(summary.names(bytes.len()).unwrap().count, 0);
        assert_eq!(&summary.to_bytes()[..], &bytes[..HEADER_LEN]);
    }
}
