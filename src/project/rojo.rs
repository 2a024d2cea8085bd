// src/project/rojo.rs

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::artifacts::write_if_changed;
use crate::config::ChiselConfig;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::manifest::list_applications;
use crate::project::ProjectPublisher;

/// Sections rebuilt wholesale on every publish, so removed apps disappear.
/// Everything else in an existing descriptor is deep-merged and preserved.
const OWNED_SECTIONS: [&str; 3] = [
    "/tree/ReplicatedStorage/Shared",
    "/tree/StarterPlayer/StarterPlayerScripts/Apps",
    "/tree/ServerScriptService/Apps",
];

/// Writes a Rojo `*.project.json` mapping each app's compiled output into the
/// data model.
#[derive(Debug, Clone)]
pub struct RojoProjectPublisher {
    fs: Arc<dyn FileSystem>,
    apps_dir: PathBuf,
    project_file: PathBuf,
    project_name: String,
    /// Compiled counterpart of the apps directory, relative to the root.
    out_apps_dir: String,
}

impl RojoProjectPublisher {
    pub fn from_config(fs: Arc<dyn FileSystem>, cfg: &ChiselConfig) -> Self {
        Self {
            fs,
            apps_dir: cfg.apps_dir.clone(),
            project_file: cfg.project_file.clone(),
            project_name: cfg.project_name.clone(),
            out_apps_dir: compiled_apps_dir(&cfg.apps_dir_rel, &cfg.out_dir_rel),
        }
    }

    /// The descriptor for the current app set, before merging.
    pub fn render(&self, apps: &[String]) -> Value {
        json!({
            "name": self.project_name,
            "tree": {
                "$className": "DataModel",
                "ReplicatedStorage": {
                    "$className": "ReplicatedStorage",
                    "Shared": self.app_section(apps, "shared"),
                    "rbxts_include": {
                        "$path": "include",
                        "node_modules": {
                            "$className": "Folder",
                            "@rbxts": { "$path": "node_modules/@rbxts" }
                        }
                    }
                },
                "StarterPlayer": {
                    "$className": "StarterPlayer",
                    "StarterPlayerScripts": {
                        "$className": "StarterPlayerScripts",
                        "Apps": self.app_section(apps, "client")
                    }
                },
                "ServerScriptService": {
                    "$className": "ServerScriptService",
                    "Apps": self.app_section(apps, "server")
                }
            }
        })
    }

    fn app_section(&self, apps: &[String], subdir: &str) -> Value {
        let mut section = Map::new();
        section.insert("$className".into(), Value::from("Folder"));
        for app in apps {
            if self.fs.is_dir(&self.apps_dir.join(app).join(subdir)) {
                let path = format!("{}/{app}/{subdir}", self.out_apps_dir);
                section.insert(capitalize(app), json!({ "$path": path }));
            }
        }
        Value::Object(section)
    }

    fn existing(&self) -> Result<Option<Value>> {
        if !self.fs.is_file(&self.project_file) {
            return Ok(None);
        }
        let text = self.fs.read_to_string(&self.project_file)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl ProjectPublisher for RojoProjectPublisher {
    fn publish(&self) -> Result<bool> {
        let apps = list_applications(self.fs.as_ref(), &self.apps_dir)?;
        let generated = self.render(&apps);

        let descriptor = match self.existing()? {
            Some(existing) => merge_descriptor(existing, &generated),
            None => generated,
        };

        let mut text = serde_json::to_string_pretty(&descriptor)?;
        text.push('\n');

        let written = write_if_changed(self.fs.as_ref(), &self.project_file, &text)?;
        if written {
            info!(path = ?self.project_file, apps = ?apps, "project descriptor updated");
        } else {
            debug!(path = ?self.project_file, "project descriptor unchanged");
        }
        Ok(written)
    }
}

/// Merge a freshly generated descriptor into a user-edited one.
pub fn merge_descriptor(existing: Value, generated: &Value) -> Value {
    let mut merged = existing;
    deep_merge(&mut merged, generated);
    for pointer in OWNED_SECTIONS {
        if let (Some(slot), Some(fresh)) = (merged.pointer_mut(pointer), generated.pointer(pointer))
        {
            *slot = fresh.clone();
        }
    }
    merged
}

fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Where the compiler emits `apps_dir_rel`.
///
/// The compiler maps the `src` root onto `out_dir_rel`, so `src/features`
/// compiles to `out/features`. An apps directory outside `src` is taken to
/// keep its relative path under `out_dir_rel`.
pub fn compiled_apps_dir(apps_dir_rel: &str, out_dir_rel: &str) -> String {
    let apps = apps_dir_rel.trim_end_matches('/');
    let out = out_dir_rel.trim_end_matches('/');
    let tail = match apps.strip_prefix("src") {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => apps,
    };
    if tail.is_empty() {
        out.to_string()
    } else {
        format!("{out}/{tail}")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
