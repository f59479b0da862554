//! Startup asset barrier
//!
//! Every texture in the manifest is loaded before any registry construction.
//! Loads run in parallel on the rayon pool and are merged into one
//! [`TextureSet`]; the first failure aborts startup.

use crate::config::AssetConfig;
use crate::error::{AssetLoadError, StartupError};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of raw asset bytes
pub trait AssetLoader: Sync {
    /// Checked once before any load is issued
    fn prepare(&self, _config: &AssetConfig) -> Result<(), AssetLoadError> {
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>, AssetLoadError>;
}

/// Reads assets from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl AssetLoader for FileSystemLoader {
    fn prepare(&self, config: &AssetConfig) -> Result<(), AssetLoadError> {
        config.validate()
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>, AssetLoadError> {
        let bytes = fs::read(path).map_err(|source| AssetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(AssetLoadError::Empty(path.to_path_buf()));
        }
        Ok(bytes)
    }
}

/// Produces placeholder bytes for every path, for headless runs without an asset tree
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticLoader;

impl AssetLoader for SyntheticLoader {
    fn load(&self, path: &Path) -> Result<Vec<u8>, AssetLoadError> {
        Ok(path.to_string_lossy().into_owned().into_bytes())
    }
}

/// Texture keys and their paths relative to the textures directory
#[derive(Debug, Clone)]
pub struct AssetManifest {
    entries: Vec<(String, String)>,
}

impl AssetManifest {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, relative_path: &str) -> Self {
        self.entries.push((key.to_string(), relative_path.to_string()));
        self
    }

    /// Textures used by the built-in scene
    pub fn standard() -> Self {
        Self::empty()
            .with("sun", "stars/2k_sun.png")
            .with("sun_blue", "stars/2k_sun_blue.png")
            .with("sun_orange", "stars/2k_sun_orange.png")
            .with("sun_red", "stars/2k_sun_red.png")
            .with("sun_white", "stars/2k_sun_white.png")
            .with("mercury", "planets/2k_mercury.jpg")
            .with("venus_surface", "planets/2k_venus_surface.jpg")
            .with("venus_atmosphere", "planets/2k_venus_atmosphere.jpg")
            .with("earth", "planets/2k_earth.jpg")
            .with("mars", "planets/2k_mars.jpg")
            .with("jupiter", "planets/2k_jupiter.jpg")
            .with("saturn", "planets/2k_saturn.jpg")
            .with("saturn_ring", "planets/2k_saturn_ring_alpha.png")
            .with("uranus", "planets/2k_uranus.jpg")
            .with("neptune", "planets/2k_neptune.jpg")
            .with("moon", "moons/2k_moon.jpg")
            .with("star", "lensflare/stellar_starview.png")
            .with("star_blue", "lensflare/stellar_starview_blue.png")
            .with("galaxy", "galaxies/milkyway.png")
            .with("galaxy_labeled", "galaxies/milkyway_labeled.png")
            .with("asteroid", "misc/asteroid.jpg")
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Loaded textures by key
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    textures: HashMap<String, Texture>,
}

impl TextureSet {
    pub fn contains(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.textures.values().map(|t| t.bytes.len()).sum()
    }
}

/// Load every manifest entry or fail
pub fn load_all<L: AssetLoader + ?Sized>(
    manifest: &AssetManifest,
    config: &AssetConfig,
    loader: &L,
) -> Result<TextureSet, StartupError> {
    let resolved = manifest
        .entries()
        .map(|(key, relative)| -> Result<_, StartupError> {
            Ok((key.to_string(), config.texture_path(relative)?))
        })
        .collect::<Result<Vec<_>, StartupError>>()?;
    loader.prepare(config)?;

    let loaded = resolved
        .into_par_iter()
        .map(|(key, path)| -> Result<_, AssetLoadError> {
            let bytes = loader.load(&path)?;
            debug!(key = %key, path = ?path, size = bytes.len(), "Loaded texture");
            Ok((key, Texture { path, bytes }))
        })
        .collect::<Result<Vec<_>, AssetLoadError>>()?;

    let textures: HashMap<_, _> = loaded.into_iter().collect();
    info!(count = textures.len(), "Texture barrier complete");
    Ok(TextureSet { textures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl AssetLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<Vec<u8>, AssetLoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = self.fail_on {
                if path.ends_with(bad) {
                    return Err(AssetLoadError::Empty(path.to_path_buf()));
                }
            }
            Ok(vec![1, 2, 3])
        }
    }

    #[test]
    fn test_load_all_merges_every_entry() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let manifest = AssetManifest::standard();
        let set = load_all(&manifest, &AssetConfig::default(), &loader).unwrap();

        assert_eq!(set.len(), manifest.len());
        assert_eq!(loader.calls.load(Ordering::SeqCst), manifest.len());
        assert!(set.contains("earth"));
        assert_eq!(
            set.get("earth").unwrap().path,
            PathBuf::from("assets/textures/planets/2k_earth.jpg")
        );
    }

    #[test]
    fn test_any_failure_aborts() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
            fail_on: Some("2k_mars.jpg"),
        };
        let err = load_all(&AssetManifest::standard(), &AssetConfig::default(), &loader)
            .unwrap_err();
        assert!(matches!(err, StartupError::Asset(AssetLoadError::Empty(_))));
    }

    #[test]
    fn test_unsafe_manifest_path_is_configuration_error() {
        let manifest = AssetManifest::empty().with("evil", "../../etc/passwd");
        let err = load_all(&manifest, &AssetConfig::default(), &SyntheticLoader).unwrap_err();
        assert!(matches!(err, StartupError::Configuration(_)));
    }

    #[test]
    fn test_file_system_loader() {
        let dir = tempfile::tempdir().unwrap();
        let textures = dir.path().join("textures").join("planets");
        fs::create_dir_all(&textures).unwrap();
        fs::write(textures.join("2k_earth.jpg"), b"jpeg").unwrap();
        fs::write(textures.join("empty.jpg"), b"").unwrap();

        let config = AssetConfig {
            asset_root: dir.path().to_path_buf(),
            ..Default::default()
        };

        let manifest = AssetManifest::empty().with("earth", "planets/2k_earth.jpg");
        let set = load_all(&manifest, &config, &FileSystemLoader).unwrap();
        assert_eq!(set.get("earth").unwrap().bytes, b"jpeg");

        let manifest = AssetManifest::empty().with("empty", "planets/empty.jpg");
        assert!(load_all(&manifest, &config, &FileSystemLoader).is_err());

        let manifest = AssetManifest::empty().with("missing", "planets/none.jpg");
        let err = load_all(&manifest, &config, &FileSystemLoader).unwrap_err();
        assert!(matches!(err, StartupError::Asset(AssetLoadError::Io { .. })));
    }

    #[test]
    fn test_missing_texture_directory_aborts_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetConfig {
            asset_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = load_all(&AssetManifest::standard(), &config, &FileSystemLoader).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Asset(AssetLoadError::MissingDirectory(_))
        ));

        // Synthetic assets need no tree on disk
        assert!(load_all(&AssetManifest::standard(), &config, &SyntheticLoader).is_ok());
    }

    #[test]
    fn test_standard_manifest_keys_are_unique() {
        let manifest = AssetManifest::standard();
        let keys: std::collections::HashSet<&str> = manifest.entries().map(|(key, _)| key).collect();
        assert_eq!(keys.len(), manifest.len());
        assert!(!keys.contains("flare0"));
    }
}
