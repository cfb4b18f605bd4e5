//! Locating and opening vector sources.
//!
//! A source is a plain file or a member of a zip archive:
//!
//! - `regions/switzerland.geojson`, `cells.geojson.gz`
//! - `gadm36_CHE_shp.zip!gadm36_CHE_0.shp`
//! - `zip://downloads/gadm36_CHE_gpkg.zip!gadm36_CHE.gpkg`
//! - `gadm36_CHE_shp.zip` (the first vector member is used)
//!
//! The format follows the file or member extension: GeoJSON (optionally
//! gzipped), ESRI shapefile with its `.dbf` and `.prj` siblings, or
//! GeoPackage.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{GeometryError, GeometryResult};
use crate::geojson::{parse_features, FeatureSource};
use crate::gpkg::read_geopackage;
use crate::shp::parse_shapefile;

const ZIP_SCHEME: &str = "zip://";

/// Vector formats that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    GeoJson { gzip: bool },
    Shapefile,
    GeoPackage,
}

impl VectorFormat {
    /// Format from a file name, by extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".geojson.gz") || lower.ends_with(".json.gz") {
            Some(Self::GeoJson { gzip: true })
        } else if lower.ends_with(".geojson") || lower.ends_with(".json") {
            Some(Self::GeoJson { gzip: false })
        } else if lower.ends_with(".shp") {
            Some(Self::Shapefile)
        } else if lower.ends_with(".gpkg") {
            Some(Self::GeoPackage)
        } else if lower.ends_with(".gz") {
            // Bare `.gz` has always meant gzipped GeoJSON
            Some(Self::GeoJson { gzip: true })
        } else {
            None
        }
    }

    /// Preference when picking a member of an archive; lower wins.
    fn rank(self) -> u8 {
        match self {
            Self::Shapefile => 0,
            Self::GeoPackage => 1,
            Self::GeoJson { gzip: false } => 2,
            Self::GeoJson { gzip: true } => 3,
        }
    }
}

/// Where a vector source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Archive {
        archive: PathBuf,
        /// Member path inside the archive; `None` picks one
        member: Option<String>,
    },
}

impl SourceLocation {
    pub fn parse(path: &Path) -> Self {
        let text = path.to_string_lossy();
        let (explicit_zip, rest) = match text.strip_prefix(ZIP_SCHEME) {
            Some(rest) => (true, rest),
            None => (false, text.as_ref()),
        };

        if let Some((archive, member)) = rest.rsplit_once('!') {
            if explicit_zip || is_zip_name(archive) {
                let member = member.trim_start_matches('/');
                return Self::Archive {
                    archive: PathBuf::from(archive),
                    member: (!member.is_empty()).then(|| member.to_string()),
                };
            }
        }
        if explicit_zip || is_zip_name(rest) {
            return Self::Archive {
                archive: PathBuf::from(rest),
                member: None,
            };
        }
        Self::File(path.to_path_buf())
    }
}

fn is_zip_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".zip")
}

/// Read every areal feature of a vector source.
pub fn read_features<P: AsRef<Path>>(path: P) -> GeometryResult<FeatureSource> {
    let path = path.as_ref();
    match SourceLocation::parse(path) {
        SourceLocation::File(file) => read_file(&file),
        SourceLocation::Archive { archive, member } => {
            read_archive_member(&archive, member.as_deref())
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GeometryError + '_ {
    move |source| GeometryError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn format_of(name: &str) -> GeometryResult<VectorFormat> {
    VectorFormat::from_name(name).ok_or_else(|| GeometryError::UnsupportedFormat(name.to_string()))
}

fn read_file(path: &Path) -> GeometryResult<FeatureSource> {
    let origin = path.display().to_string();
    match format_of(&origin)? {
        VectorFormat::GeoJson { gzip } => {
            let file = File::open(path).map_err(io_error(path))?;
            if gzip {
                parse_features(BufReader::new(GzDecoder::new(file)), &origin)
            } else {
                parse_features(BufReader::new(file), &origin)
            }
        }
        VectorFormat::Shapefile => {
            let shp = std::fs::read(path).map_err(io_error(path))?;
            let dbf_path = sibling_file(path, "dbf").ok_or_else(|| GeometryError::Shapefile {
                path: origin.clone(),
                message: "no .dbf attribute table next to it".to_string(),
            })?;
            let dbf = std::fs::read(&dbf_path).map_err(io_error(&dbf_path))?;
            let prj = match sibling_file(path, "prj") {
                Some(prj_path) => Some(std::fs::read_to_string(&prj_path).map_err(io_error(&prj_path))?),
                None => None,
            };
            parse_shapefile(&shp, &dbf, prj.as_deref(), &origin)
        }
        VectorFormat::GeoPackage => read_geopackage(path, &origin),
    }
}

/// `stem.<extension>` next to `path`, in either letter case.
fn sibling_file(path: &Path, extension: &str) -> Option<PathBuf> {
    [extension.to_string(), extension.to_ascii_uppercase()]
        .into_iter()
        .map(|ext| path.with_extension(ext))
        .find(|p| p.is_file())
}

fn read_archive_member(archive_path: &Path, member: Option<&str>) -> GeometryResult<FeatureSource> {
    let archive_name = archive_path.display().to_string();
    let zip_error = |source| GeometryError::Archive {
        path: archive_name.clone(),
        source,
    };

    let file = File::open(archive_path).map_err(io_error(archive_path))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let member = match member {
        Some(member) => member.to_string(),
        None => choose_member(&names).ok_or_else(|| GeometryError::NoGeometry(archive_name.clone()))?,
    };
    let origin = format!("{}!{}", archive_name, member);
    debug!(archive = %archive_name, member = %member, "Reading archive member");

    match format_of(&member)? {
        VectorFormat::GeoJson { gzip } => {
            let bytes = read_member(&mut archive, &archive_name, &member)?;
            if gzip {
                parse_features(GzDecoder::new(bytes.as_slice()), &origin)
            } else {
                parse_features(bytes.as_slice(), &origin)
            }
        }
        VectorFormat::Shapefile => {
            let shp = read_member(&mut archive, &archive_name, &member)?;
            let dbf_name = sibling_member(&names, &member, "dbf").ok_or_else(|| {
                GeometryError::MissingMember {
                    archive: archive_name.clone(),
                    member: replace_extension(&member, "dbf"),
                }
            })?;
            let dbf = read_member(&mut archive, &archive_name, &dbf_name)?;
            let prj = match sibling_member(&names, &member, "prj") {
                Some(prj_name) => {
                    let bytes = read_member(&mut archive, &archive_name, &prj_name)?;
                    Some(String::from_utf8_lossy(&bytes).into_owned())
                }
                None => None,
            };
            parse_shapefile(&shp, &dbf, prj.as_deref(), &origin)
        }
        VectorFormat::GeoPackage => {
            // SQLite needs a real file
            let bytes = read_member(&mut archive, &archive_name, &member)?;
            let scratch = tempfile::Builder::new()
                .prefix("wind-compare-")
                .suffix(".gpkg")
                .tempfile()
                .map_err(io_error(archive_path))?;
            std::fs::write(scratch.path(), &bytes).map_err(io_error(scratch.path()))?;
            read_geopackage(scratch.path(), &origin)
        }
    }
}

/// First vector member, preferring shapefiles, then GeoPackages, then
/// GeoJSON; ties go to the lexically smallest name.
fn choose_member(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter(|n| !n.ends_with('/') && !n.starts_with("__MACOSX"))
        .filter_map(|n| VectorFormat::from_name(n).map(|f| (f.rank(), n)))
        .min()
        .map(|(_, n)| n.clone())
}

fn replace_extension(member: &str, extension: &str) -> String {
    match member.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, extension),
        None => format!("{}.{}", member, extension),
    }
}

fn sibling_member(names: &[String], member: &str, extension: &str) -> Option<String> {
    let wanted = replace_extension(member, extension);
    names.iter().find(|n| n.eq_ignore_ascii_case(&wanted)).cloned()
}

fn read_member<R>(archive: &mut ZipArchive<R>, archive_name: &str, member: &str) -> GeometryResult<Vec<u8>>
where
    R: Read + std::io::Seek,
{
    let mut entry = archive.by_name(member).map_err(|source| match source {
        ZipError::FileNotFound => GeometryError::MissingMember {
            archive: archive_name.to_string(),
            member: member.to_string(),
        },
        source => GeometryError::Archive {
            path: archive_name.to_string(),
            source,
        },
    })?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|source| GeometryError::Io {
            path: format!("{}!{}", archive_name, member),
            source,
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_forms() {
        assert_eq!(
            SourceLocation::parse(Path::new("zip:///data/gadm.zip!gadm36_CHE.gpkg")),
            SourceLocation::Archive {
                archive: PathBuf::from("/data/gadm.zip"),
                member: Some("gadm36_CHE.gpkg".to_string()),
            }
        );
        assert_eq!(
            SourceLocation::parse(Path::new("data/gadm_shp.zip!gadm36_CHE_0.shp")),
            SourceLocation::Archive {
                archive: PathBuf::from("data/gadm_shp.zip"),
                member: Some("gadm36_CHE_0.shp".to_string()),
            }
        );
        assert_eq!(
            SourceLocation::parse(Path::new("data/GADM.ZIP")),
            SourceLocation::Archive {
                archive: PathBuf::from("data/GADM.ZIP"),
                member: None,
            }
        );
        // A `!` outside an archive name is part of the file name
        assert_eq!(
            SourceLocation::parse(Path::new("data/wow!.geojson")),
            SourceLocation::File(PathBuf::from("data/wow!.geojson"))
        );
    }

    #[test]
    fn test_formats_by_extension() {
        assert_eq!(VectorFormat::from_name("a.GeoJSON"), Some(VectorFormat::GeoJson { gzip: false }));
        assert_eq!(VectorFormat::from_name("polys.geojson.gz"), Some(VectorFormat::GeoJson { gzip: true }));
        assert_eq!(VectorFormat::from_name("x/gadm36_CHE_0.SHP"), Some(VectorFormat::Shapefile));
        assert_eq!(VectorFormat::from_name("gadm36_CHE.gpkg"), Some(VectorFormat::GeoPackage));
        assert_eq!(VectorFormat::from_name("gadm36_CHE_0.dbf"), None);
    }

    #[test]
    fn test_choose_member_prefers_first_shapefile() {
        let names: Vec<String> = [
            "license.txt",
            "gadm36_CHE_1.shp",
            "gadm36_CHE_0.dbf",
            "gadm36_CHE_0.shp",
            "extra.geojson",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(choose_member(&names).as_deref(), Some("gadm36_CHE_0.shp"));
        assert_eq!(choose_member(&names[..1]), None);
    }

    #[test]
    fn test_sibling_member_ignores_case() {
        let names = vec!["dir/REGION.SHP".to_string(), "dir/REGION.DBF".to_string()];
        assert_eq!(sibling_member(&names, "dir/REGION.SHP", "dbf").as_deref(), Some("dir/REGION.DBF"));
        assert_eq!(sibling_member(&names, "dir/REGION.SHP", "prj"), None);
    }
}
