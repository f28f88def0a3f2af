use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sgp4::Elements;

use crate::orbit::parsing::parse_multi_tle;
use crate::orbit::{OrbitError, TleOrbit};

pub struct CatalogEntry {
    pub name: String,
    pub norad_id: u64,
    pub source: String,
    pub elements: Elements,
}

/// Element sets loaded from a `.tle`/`.txt` file or a directory of them.
pub struct TleCatalog {
    path: PathBuf,
    satellites: HashMap<u64, CatalogEntry>,
}

impl TleCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            satellites: HashMap::new(),
        }
    }

    pub fn load_all(&mut self) -> Result<(), OrbitError> {
        if !self.path.exists() {
            return Err(OrbitError::CatalogNotFound(self.path.display().to_string()));
        }

        self.satellites.clear();

        if self.path.is_file() {
            let entries = parse_tle_file(&self.path)?;
            self.insert_all(entries);
            return Ok(());
        }

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if !path.is_file() || !has_tle_extension(&path) {
                continue;
            }
            match parse_tle_file(&path) {
                Ok(entries) => self.insert_all(entries),
                Err(e) => {
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                }
            }
        }

        if self.is_empty() {
            log::warn!("No satellites found in {}", self.path.display());
        } else {
            log::info!("Loaded {} satellites from {}", self.len(), self.path.display());
        }
        Ok(())
    }

    fn insert_all(&mut self, entries: Vec<CatalogEntry>) {
        for entry in entries {
            self.satellites.insert(entry.norad_id, entry);
        }
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub fn get(&self, norad_id: u64) -> Option<&CatalogEntry> {
        self.satellites.get(&norad_id)
    }

    /// Build an orbit from the catalog. Without a NORAD id the catalog must
    /// hold exactly one satellite.
    pub fn orbit(&self, norad_id: Option<u64>) -> Result<TleOrbit, OrbitError> {
        let entry = match norad_id {
            Some(id) => self.get(id).ok_or(OrbitError::UnknownSatellite(id))?,
            None if self.len() == 1 => self
                .satellites
                .values()
                .next()
                .ok_or(OrbitError::UnknownSatellite(0))?,
            None => {
                return Err(OrbitError::CatalogEntry {
                    file: self.path.display().to_string(),
                    message: format!(
                        "{} satellites loaded, a norad_id is required",
                        self.satellites.len()
                    ),
                })
            }
        };
        TleOrbit::from_elements(entry.elements.clone())
    }
}

fn has_tle_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tle") | Some("txt")
    )
}

fn parse_tle_file(path: &Path) -> Result<Vec<CatalogEntry>, OrbitError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let mut results = Vec::new();
    for (name, line1, line2) in parse_multi_tle(&content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| OrbitError::CatalogEntry {
                file: filename.clone(),
                message: e.to_string(),
            })?;

        results.push(CatalogEntry {
            name: name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id)),
            norad_id: elements.norad_id,
            source: filename.clone(),
            elements,
        });
    }

    Ok(results)
}
