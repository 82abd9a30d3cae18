use std::sync::{Mutex, MutexGuard};

use crate::audio::domain::audio_decoder::{AudioDecoder, DecodeError};
use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::waveform::Waveform;
use crate::shared::content_hash::ContentHash;
use crate::shared::lru_cache::{CacheStats, LruCache};

type DecodeKey = (ContentHash, Option<u32>);

/// Memoizes another decoder for the lifetime of a session.
///
/// Entries are keyed by the SHA-256 of the encoded bytes plus the requested
/// rate, so a renamed upload hits the cache and a changed file with the same
/// name does not. Failed decodes are not stored. Eviction is LRU beyond
/// `capacity`; `clear` drops everything at any time.
pub struct CachedDecoder<D: AudioDecoder> {
    inner: D,
    cache: Mutex<LruCache<DecodeKey, Waveform>>,
}

impl<D: AudioDecoder> CachedDecoder<D> {
    pub fn new(inner: D, capacity: usize) -> Self {
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

    fn lock(&self) -> MutexGuard<'_, LruCache<DecodeKey, Waveform>> {
        // The cache only memoizes a pure function, so a poisoned map is still usable.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<D: AudioDecoder> AudioDecoder for CachedDecoder<D> {
    fn decode(
        &self,
        source: &AudioSource,
        target_sample_rate: Option<u32>,
    ) -> Result<Waveform, DecodeError> {
        let key = (source.content_hash(), target_sample_rate);
        if let Some(waveform) = self.lock().get(&key) {
            log::debug!("Decode cache hit for {} ({:?})", source.origin(), key.0);
            return Ok(waveform);
        }

        let waveform = self.inner.decode(source, target_sample_rate)?;
        self.lock().insert(key, waveform.clone());
        Ok(waveform)
    }
}
