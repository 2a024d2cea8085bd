// src/artifacts/sentinel.rs

//! The change-sentinel module.
//!
//! The compiler's incremental build only revisits dependents of files whose
//! content changed. Stubs rarely change, so the sentinel carries a hash of the
//! full manifest: any added, removed or re-saved watched file changes it.

use blake3::Hasher;

use crate::errors::Result;
use crate::manifest::Manifest;

/// blake3 hex digest of the manifest's canonical JSON form.
pub fn manifest_hash(manifest: &Manifest) -> Result<String> {
    let canonical = serde_json::to_vec(manifest)?;
    let mut hasher = Hasher::new();
    hasher.update(&canonical);
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn render_sentinel(manifest: &Manifest) -> Result<String> {
    let hash = manifest_hash(manifest)?;
    let apps = serde_json::to_string(&manifest.applications)?;
    Ok(format!(
        "// generated by chisel; do not edit\n\
         export const MANIFEST_HASH = \"{hash}\";\n\
         export const MANIFEST_APPS = {apps} as const;\n"
    ))
}
