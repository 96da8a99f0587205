//! Native metrics plugin loaded from a shared library.
//!
//! The plugin exports two C-ABI functions:
//! - `fetch`: `char* (*)(void)`, returns a NUL-terminated UTF-8 JSON string
//!   whose ownership passes to the caller;
//! - `release`: `void (*)(char*)`, frees a string returned by `fetch`.
//!
//! Every non-null pointer returned by `fetch` is wrapped in `MetricsText`
//! before anything else happens, so it is released exactly once whatever path
//! the caller takes afterwards.

use std::ffi::{c_char, CStr};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use libloading::Library;
use tracing::{debug, info, warn};

use sysguard_core::error::{Result, SysGuardError};

use crate::config::PluginConfig;
use crate::plugin::MetricsSource;

type FetchFn = unsafe extern "C" fn() -> *mut c_char;
type ReleaseFn = unsafe extern "C" fn(*mut c_char);

/// Resolved entry points. Only valid while the owning `Library` is loaded.
#[derive(Clone, Copy)]
struct EntryPoints {
    fetch: FetchFn,
    release: ReleaseFn,
}

impl EntryPoints {
    /// Call the plugin once and copy the result out.
    ///
    /// # Safety
    /// Both function pointers must still be mapped.
    unsafe fn fetch_owned(&self) -> Result<String> {
        let raw = unsafe { (self.fetch)() };
        let text = unsafe { MetricsText::from_raw(raw, self.release) }
            .ok_or_else(|| SysGuardError::Fetch("plugin returned null".into()))?;
        let owned = text.to_owned_string()?;
        if owned.is_empty() {
            return Err(SysGuardError::Fetch("plugin returned an empty document".into()));
        }
        Ok(owned)
    }
}

/// Plugin-owned metrics string, released on drop.
pub struct MetricsText {
    ptr: NonNull<c_char>,
    release: ReleaseFn,
}

impl MetricsText {
    /// # Safety
    /// `ptr` must be null or a NUL-terminated string returned by the fetch
    /// function paired with `release`, not yet released.
    unsafe fn from_raw(ptr: *mut c_char, release: ReleaseFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, release })
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }.to_bytes()
    }

    pub fn to_owned_string(&self) -> Result<String> {
        std::str::from_utf8(self.as_bytes())
            .map(str::to_owned)
            .map_err(|e| SysGuardError::Fetch(format!("plugin returned invalid utf-8: {e}")))
    }
}

impl Drop for MetricsText {
    fn drop(&mut self) {
        unsafe { (self.release)(self.ptr.as_ptr()) }
    }
}

struct LoadedLibrary {
    entry: EntryPoints,
    /// Present when `serialize_calls` is set.
    gate: Option<Mutex<()>>,
    library: Library,
}

impl LoadedLibrary {
    fn fetch_blocking(&self) -> Result<String> {
        let _guard = self
            .gate
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
        // `self.library` outlives this call: we hold `&self`.
        unsafe { self.entry.fetch_owned() }
    }
}

/// Handle to the loaded plugin. Cloning the inner `Arc` is how in-flight
/// calls keep the library mapped.
pub struct NativePlugin {
    path: PathBuf,
    inner: Arc<LoadedLibrary>,
}

impl NativePlugin {
    /// Open the library and resolve both entry points.
    pub fn load(cfg: &PluginConfig) -> Result<Self> {
        let path = cfg.path.clone();
        let library = unsafe { Library::new(&path) }
            .map_err(|e| SysGuardError::PluginLoad(format!("{}: {e}", path.display())))?;

        let fetch: FetchFn = unsafe {
            *library
                .get::<FetchFn>(cfg.fetch_symbol.as_bytes())
                .map_err(|e| {
                    SysGuardError::PluginLoad(format!("symbol {}: {e}", cfg.fetch_symbol))
                })?
        };
        let release: ReleaseFn = unsafe {
            *library
                .get::<ReleaseFn>(cfg.release_symbol.as_bytes())
                .map_err(|e| {
                    SysGuardError::PluginLoad(format!("symbol {}: {e}", cfg.release_symbol))
                })?
        };

        info!(
            path = %path.display(),
            fetch = %cfg.fetch_symbol,
            release = %cfg.release_symbol,
            serialized = cfg.serialize_calls,
            "metrics plugin loaded"
        );

        Ok(Self {
            path,
            inner: Arc::new(LoadedLibrary {
                entry: EntryPoints { fetch, release },
                gate: cfg.serialize_calls.then(|| Mutex::new(())),
                library,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the library. If a call is somehow still holding it, the close is
    /// deferred to that call's completion instead of pulling code out from
    /// under it.
    pub fn unload(self) -> Result<()> {
        match Arc::try_unwrap(self.inner) {
            Ok(loaded) => {
                loaded.library.close().map_err(|e| {
                    SysGuardError::PluginLoad(format!("{}: close failed: {e}", self.path.display()))
                })?;
                info!(path = %self.path.display(), "metrics plugin unloaded");
                Ok(())
            }
            Err(shared) => {
                warn!(
                    path = %self.path.display(),
                    holders = Arc::strong_count(&shared),
                    "plugin still in use; close deferred to last holder"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MetricsSource for NativePlugin {
    fn describe(&self) -> String {
        format!("native:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<String> {
        let inner = Arc::clone(&self.inner);
        let res = tokio::task::spawn_blocking(move || inner.fetch_blocking())
            .await
            .map_err(|e| SysGuardError::Fetch(format!("plugin call did not complete: {e}")))?;
        if let Err(e) = &res {
            debug!(error = %e, "plugin fetch failed");
        }
        res
    }
}
