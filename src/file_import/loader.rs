use super::{
    bake,
    manifest::{AssetEntry, AssetKind, AssetManifest},
};
use crate::{
    mesh_import::ImportOptions,
    model_format::{self, BakedModel},
    oss_error::OssError,
};
use ahash::AHashMap;
use log::info;
use parking_lot::Mutex;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::{path::Path, sync::Arc};

/// Baked model caching in a multithread friendly way.
/// Uses `ahash::AHashMap` in place of `std::collections::HashMap` because
/// ahash is already a dependency of the importer. This struct may be sent
/// across threads, so the cache is wrapped in a `parking_lot::Mutex`.
pub struct ModelCache {
    cache: Mutex<AHashMap<String, Arc<BakedModel>>>,
}

impl ModelCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Reserve space to perhaps avoid some realloc/rehash.
            cache: Mutex::new(AHashMap::with_capacity(16)),
        }
    }

    /// Caches baked models by path for improved performance
    ///
    /// # Errors
    /// May return `OssError`
    pub fn load(&self, path: &Path) -> Result<Arc<BakedModel>, OssError> {
        let key = path.display().to_string();
        // This is a potentially long critical section, but probably only
        // one thread is actually loading anyway and the Mutex is just for
        // safety.
        let mut cache = self.cache.lock();
        if let Some(model) = cache.get(&key) {
            info!("Model cache hit: {}", key);
            Ok(model.clone())
        } else {
            info!("Model cache miss: {}", key);
            let model = Arc::new(model_format::load(path)?);
            cache.insert(key, model.clone());
            drop(cache); // Probably makes no difference but makes clippy happy
            Ok(model)
        }
    }

    /// Returns a model that is already in the cache
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Arc<BakedModel>> {
        self.cache.lock().get(&path.display().to_string()).cloned()
    }

    /// Loads every entry of a manifest into the cache. `Baked` entries
    /// load directly. `Source` entries run through the bake step in
    /// memory, which is slower but lets a scene be iterated on without
    /// baking files first. With the `rayon` feature the entries are
    /// loaded in parallel.
    ///
    /// # Errors
    /// Fails on the first entry that does not load
    pub fn load_manifest(
        &self,
        manifest: &AssetManifest,
    ) -> Result<(), OssError> {
        #[cfg(feature = "rayon")]
        let result = manifest
            .assets
            .par_iter()
            .try_for_each(|entry| self.load_entry(manifest, entry));
        #[cfg(not(feature = "rayon"))]
        let result = manifest
            .assets
            .iter()
            .try_for_each(|entry| self.load_entry(manifest, entry));
        result
    }

    fn load_entry(
        &self,
        manifest: &AssetManifest,
        entry: &AssetEntry,
    ) -> Result<(), OssError> {
        let path = manifest.resolve(entry);
        match entry.kind {
            AssetKind::Baked => {
                self.load(&path)?;
            }
            AssetKind::Source => {
                let key = path.display().to_string();
                if self.cache.lock().get(&key).is_some() {
                    info!("Model cache hit: {}", key);
                    return Ok(());
                }
                info!("Baking into cache: {}", key);
                let model = Arc::new(bake::bake_model(
                    &path,
                    &ImportOptions::default(),
                )?);
                self.cache.lock().insert(key, model);
            }
        }
        Ok(())
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}
