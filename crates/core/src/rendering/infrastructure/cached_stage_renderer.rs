use std::sync::{Mutex, MutexGuard};

use crate::audio::domain::waveform::Waveform;
use crate::rendering::domain::stage_artifacts::StageArtifacts;
use crate::rendering::domain::stage_renderer::{RenderError, StageRenderer};
use crate::shared::content_hash::ContentHash;
use crate::shared::lru_cache::{CacheStats, LruCache};

/// Memoizes rendered artifacts by output content.
///
/// The key hashes the samples, rate and stage name, so re-running a pipeline
/// with a different seed or parameter misses the cache while an unchanged
/// stage is served from it. Render failures are not stored.
pub struct CachedStageRenderer<R: StageRenderer> {
    inner: R,
    cache: Mutex<LruCache<ContentHash, StageArtifacts>>,
}

impl<R: StageRenderer> CachedStageRenderer<R> {
    pub fn new(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<ContentHash, StageArtifacts>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<R: StageRenderer> StageRenderer for CachedStageRenderer<R> {
    fn render(&self, waveform: &Waveform, stage_name: &str) -> Result<StageArtifacts, RenderError> {
        let key = ContentHash::of_samples(waveform.samples(), waveform.sample_rate(), stage_name);
        if let Some(artifacts) = self.lock().get(&key) {
            log::debug!("Render cache hit for stage '{stage_name}'");
            return Ok(artifacts);
        }
        let artifacts = self.inner.render(waveform, stage_name)?;
        self.lock().insert(key, artifacts.clone());
        Ok(artifacts)
    }
}
