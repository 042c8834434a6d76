//! File cache for provider replies + daily call budget.
//!
//! Only replies that parse as a structured object are stored. The key covers the
//! provider's cache scope (model and sampling knobs) and the rendered prompt.
//!
//! Cache hits never consume budget; only successful real calls do. Cache and
//! counter I/O is best-effort: a broken cache directory degrades to direct calls.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{parse_structured_reply, TextProvider, Unavailable};

pub struct CachingProvider<P: TextProvider> {
    inner: P,
    cache_dir: PathBuf,
    daily_limit: Option<u32>,
    counter: Mutex<DailyCounter>,
}

impl<P: TextProvider> CachingProvider<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit: Option<u32>) -> Self {
        let _ = fs::create_dir_all(&cache_dir);
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit,
            counter,
        }
    }

    /// Real calls made today (cache hits excluded).
    pub fn calls_today(&self) -> u32 {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        if g.is_expired() {
            g.reset_to_today();
        }
        g.count
    }

    fn budget_left(&self) -> bool {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        if g.is_expired() {
            g.reset_to_today();
            let _ = save_daily_counter(&self.cache_dir, &g);
        }
        self.daily_limit.map_or(true, |max| g.count < max)
    }

    fn record_call(&self) {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        g.count = g.count.saturating_add(1);
        let _ = save_daily_counter(&self.cache_dir, &g);
    }
}

#[async_trait]
impl<P: TextProvider> TextProvider for CachingProvider<P> {
    async fn complete(&self, prompt: &str) -> Result<String, Unavailable> {
        let key = cache_key(&self.inner.cache_scope(), prompt);
        // Unparsable entries count as misses.
        if let Some(hit) = read_cache_file(&self.cache_dir, &key).filter(|h| is_usable(&h.text)) {
            debug!(key = %key, "backend cache hit");
            return Ok(hit.text);
        }

        if !self.budget_left() {
            return Err(Unavailable::BudgetExhausted);
        }

        let text = self.inner.complete(prompt).await?;
        self.record_call();
        if is_usable(&text) {
            let _ = write_cache_file(&self.cache_dir, &key, &CachedReply { text: text.clone() });
        } else {
            debug!(key = %key, "unparsable reply not cached");
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn cache_scope(&self) -> String {
        self.inner.cache_scope()
    }
}

/// Only replies that parse to a structured object are worth replaying.
fn is_usable(text: &str) -> bool {
    parse_structured_reply(text).is_ok()
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedReply {
    text: String,
}

fn cache_key(scope: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<CachedReply> {
    let s = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &CachedReply) -> io::Result<()> {
    let path = cache_path(dir, key);
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    write_atomic(&path, json.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }

    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let json = serde_json::to_string(dc).map_err(io::Error::other)?;
    write_atomic(&counter_path(dir), json.as_bytes())
}
