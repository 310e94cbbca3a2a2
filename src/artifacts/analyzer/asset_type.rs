use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk format, decided by file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFormat {
    /// `.uasset`: package with a parseable header.
    Package,
    /// `.umap`: level package with a parseable header.
    Map,
    /// `.uexp`: export payload split out of a package.
    ExportData,
    /// `.ubulk`: bulk payload split out of a package.
    BulkData,
    Unrecognized,
}

pub const ASSET_FORMATS: phf::Map<&'static str, AssetFormat> = phf::phf_map! {
    "uasset" => AssetFormat::Package,
    "umap" => AssetFormat::Map,
    "uexp" => AssetFormat::ExportData,
    "ubulk" => AssetFormat::BulkData,
};

impl AssetFormat {
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ASSET_FORMATS.get(ext.to_ascii_lowercase().as_str()))
            .copied()
            .unwrap_or(AssetFormat::Unrecognized)
    }

    /// Whether files of this format start with a package header.
    pub fn has_header(&self) -> bool {
        matches!(self, AssetFormat::Package | AssetFormat::Map)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, AssetFormat::Unrecognized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Level,
    Blueprint,
    Material,
    StaticMesh,
    SkeletalMesh,
    Texture,
    Sound,
    Animation,
    DataTable,
    Generic,
    ExportData,
    BulkData,
    Other,
}

/// Class names that identify what a package holds.
pub const CLASS_ASSET_TYPES: phf::Map<&'static str, AssetType> = phf::phf_map! {
    "Material" => AssetType::Material,
    "MaterialInstanceConstant" => AssetType::Material,
    "MaterialFunction" => AssetType::Material,
    "StaticMesh" => AssetType::StaticMesh,
    "SkeletalMesh" => AssetType::SkeletalMesh,
    "Texture2D" => AssetType::Texture,
    "TextureCube" => AssetType::Texture,
    "SoundWave" => AssetType::Sound,
    "SoundCue" => AssetType::Sound,
    "AnimSequence" => AssetType::Animation,
    "AnimMontage" => AssetType::Animation,
    "DataTable" => AssetType::DataTable,
};

/// Naming-convention prefixes, checked in order against the file stem.
const NAME_PREFIXES: [(&str, AssetType); 8] = [
    ("MI_", AssetType::Material),
    ("M_", AssetType::Material),
    ("SM_", AssetType::StaticMesh),
    ("SK_", AssetType::SkeletalMesh),
    ("T_", AssetType::Texture),
    ("SW_", AssetType::Sound),
    ("AS_", AssetType::Animation),
    ("DT_", AssetType::DataTable),
];

impl AssetType {
    /// Classify an asset from what the analyzer learned about it
    ///
    /// Format wins for levels and split payloads, then blueprint detection,
    /// then the first class name found in the name table, then the file-name
    /// prefix convention.
    pub fn classify(format: AssetFormat, path: &Path, names: &[String], is_blueprint: bool) -> Self {
        match format {
            AssetFormat::Map => return AssetType::Level,
            AssetFormat::ExportData => return AssetType::ExportData,
            AssetFormat::BulkData => return AssetType::BulkData,
            AssetFormat::Unrecognized => return AssetType::Other,
            AssetFormat::Package => {}
        }

        if is_blueprint {
            return AssetType::Blueprint;
        }

        names
            .iter()
            .find_map(|name| CLASS_ASSET_TYPES.get(name.as_str()).copied())
            .or_else(|| Self::from_name_prefix(path))
            .unwrap_or(AssetType::Generic)
    }

    fn from_name_prefix(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        NAME_PREFIXES
            .iter()
            .find(|(prefix, _)| stem.starts_with(prefix))
            .map(|(_, asset_type)| *asset_type)
    }

    /// Extra complexity carried by heavyweight categories.
    pub fn category_bonus(&self) -> f64 {
        match self {
            AssetType::Level => 20.0,
            AssetType::Material => 10.0,
            AssetType::StaticMesh | AssetType::SkeletalMesh => 5.0,
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Level => "level",
            AssetType::Blueprint => "blueprint",
            AssetType::Material => "material",
            AssetType::StaticMesh => "static_mesh",
            AssetType::SkeletalMesh => "skeletal_mesh",
            AssetType::Texture => "texture",
            AssetType::Sound => "sound",
            AssetType::Animation => "animation",
            AssetType::DataTable => "data_table",
            AssetType::Generic => "generic",
            AssetType::ExportData => "export_data",
            AssetType::BulkData => "bulk_data",
            AssetType::Other => "other",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
