//! Compilation cache keyed by template content hash
//!
//! Compiled forms are memoized under the SHA-256 of the exact template text.
//! Entries expire after their TTL; expired entries are skipped on lookup and
//! physically removed by a sweep that runs on a small random fraction of
//! `compile` calls, or explicitly through [`CompilationCache::sweep_expired`].

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    config::CacheConfig,
    error::Result,
    templates::parser::{ParsedTemplate, TemplateParser},
};

/// Turns template text into a compiled form
pub trait TemplateCompiler: Send + Sync {
    /// Compiled representation
    type Output: Send + Sync;

    /// Compile `source`
    fn compile(&self, source: &str) -> Result<Self::Output>;

    /// Compiler name for logging and errors
    fn name(&self) -> &str;
}

/// Compiles templates into the engine's element tree
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockTreeCompiler;

impl TemplateCompiler for BlockTreeCompiler {
    type Output = ParsedTemplate;

    fn compile(&self, source: &str) -> Result<ParsedTemplate> {
        TemplateParser::parse(source)
    }

    fn name(&self) -> &str {
        "block-tree"
    }
}

/// A cached compiled form
#[derive(Debug)]
pub struct CachedCompilation<T> {
    /// Compiled form, shared with callers
    pub compiled: Arc<T>,
    /// When the entry was created
    pub created_at: Instant,
    /// Maximum age before the entry is considered expired
    pub ttl: Duration,
}

impl<T> CachedCompilation<T> {
    /// Whether the entry is expired at `now`
    ///
    /// A zero TTL is always expired, regardless of elapsed time.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.ttl.is_zero() || now.saturating_duration_since(self.created_at) > self.ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries, including expired ones not yet swept
    pub size: usize,
    /// Content hashes of stored entries, sorted
    pub keys: Vec<String>,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compile
    pub misses: u64,
    /// Successful compilations
    pub compilations: u64,
    /// Entries removed by sweeps or the size cap
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a fraction in `[0, 1]`
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Content hash used as the cache key
pub fn content_hash(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Memoizes compiled templates by content hash
pub struct CompilationCache<C: TemplateCompiler = BlockTreeCompiler> {
    compiler: C,
    entries: RwLock<HashMap<String, CachedCompilation<C::Output>>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
    evictions: AtomicU64,
}

impl CompilationCache<BlockTreeCompiler> {
    /// Cache around the block-tree compiler with default settings
    pub fn new() -> Self {
        Self::with_compiler(BlockTreeCompiler, CacheConfig::default())
    }
}

impl Default for CompilationCache<BlockTreeCompiler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TemplateCompiler> CompilationCache<C> {
    /// Cache around a specific compiler
    pub fn with_compiler(compiler: C, config: CacheConfig) -> Self {
        Self {
            compiler,
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The wrapped compiler
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Compiled form of `source`, compiling only on a miss
    pub fn compile(&self, source: &str) -> Result<Arc<C::Output>> {
        self.compile_with_ttl(source, self.config.ttl())
    }

    /// Like [`CompilationCache::compile`], storing a new entry with `ttl`
    pub fn compile_with_ttl(&self, source: &str, ttl: Duration) -> Result<Arc<C::Output>> {
        if self.config.sweep_probability > 0.0 && rand::random::<f64>() < self.config.sweep_probability
        {
            self.sweep_expired();
        }

        let key = content_hash(source);
        let now = Instant::now();

        if let Some(entry) = self.entries.read().get(&key) {
            if !entry.is_expired_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %short(&key), "Template cache hit");
                return Ok(Arc::clone(&entry.compiled));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %short(&key), compiler = self.compiler.name(), "Template cache miss");

        // Compile outside the lock; a racing compile of the same text only
        // replaces an equivalent entry.
        let compiled = Arc::new(self.compiler.compile(source)?);
        self.compilations.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        entries.insert(
            key,
            CachedCompilation {
                compiled: Arc::clone(&compiled),
                created_at: Instant::now(),
                ttl,
            },
        );
        if let Some(max) = self.config.max_entries {
            let evicted = evict_oldest(&mut entries, max);
            if evicted > 0 {
                self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            }
        }

        Ok(compiled)
    }

    /// Remove every expired entry; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired_at(now));
            before - entries.len()
        };
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!(removed, "Swept expired template cache entries");
        }
        removed
    }

    /// Remove everything
    pub fn clear(&self) {
        self.entries.write().clear();
        tracing::debug!("Template cache cleared");
    }

    /// Whether a live entry exists for `source`
    pub fn contains(&self, source: &str) -> bool {
        let key = content_hash(source);
        self.entries
            .read()
            .get(&key)
            .is_some_and(|e| !e.is_expired_at(Instant::now()))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

fn evict_oldest<T>(entries: &mut HashMap<String, CachedCompilation<T>>, max: usize) -> usize {
    let mut evicted = 0;
    while entries.len() > max {
        let oldest = entries
            .iter()
            .min_by_key(|(_, e)| e.created_at)
            .map(|(k, _)| k.clone());
        match oldest {
            Some(key) => {
                entries.remove(&key);
                evicted += 1;
            }
            None => break,
        }
    }
    evicted
}

fn short(key: &str) -> &str {
    &key[..key.len().min(12)]
}
