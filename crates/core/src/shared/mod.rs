pub mod constants;
pub mod content_hash;
pub mod lru_cache;
pub mod render_settings;
