// src/artifacts/stubs.rs

use std::path::{Path, PathBuf};

/// Location of the generated stub inside each application directory.
pub const CLIENT_STUB_REL: [&str; 3] = ["client", "gen", "index.client.ts"];

pub fn client_stub_path(apps_dir: &Path, app: &str) -> PathBuf {
    CLIENT_STUB_REL
        .iter()
        .fold(apps_dir.join(app), |acc, part| acc.join(part))
}

pub fn render_client_stub(app: &str) -> String {
    format!(
        "// generated client stub for {app}\n\
         export const client = {{ ping: () => warn(\"[{app}] stub\") }} as const;\n"
    )
}
