// tests/one_shot_scenario.rs

use std::path::Path;
use std::sync::Arc;

use chisel::fs::mock::MockFileSystem;
use chisel::fs::{FileSystem, RealFileSystem};
use chisel::project::{ProjectPublisher, RojoProjectPublisher};
use chisel::watch::WatchSession;
use chisel_test_utils::builders::{ConfigBuilder, ProjectTree};
use chisel_test_utils::fake_compiler::FakeCompiler;
use chisel_test_utils::init_tracing;

const ALPHA_STUB: &str = "src/apps/alpha/client/gen/index.client.ts";
const BETA_STUB: &str = "src/apps/beta/client/gen/index.client.ts";
const SENTINEL: &str = "src/chisel/__generated__/manifest-hash.ts";
const DESCRIPTOR: &str = "default.project.json";

fn mtime(tree: &ProjectTree, rel: &str) -> std::time::SystemTime {
    std::fs::metadata(tree.path(rel)).unwrap().modified().unwrap()
}

fn session(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    compiler: FakeCompiler,
) -> WatchSession<FakeCompiler> {
    let cfg = ConfigBuilder::new().build_arc(root);
    let publisher: Arc<dyn ProjectPublisher> =
        Arc::new(RojoProjectPublisher::from_config(fs.clone(), &cfg));
    WatchSession::new(cfg, fs, publisher, compiler).unwrap()
}

#[tokio::test]
async fn two_apps_one_shot_writes_stubs_sentinel_and_compiles_once() {
    init_tracing();
    let tree = ProjectTree::new()
        .app("alpha", &["shared"])
        .app("beta", &["shared"]);
    let compiler = FakeCompiler::new();

    let code = session(Arc::new(RealFileSystem), tree.root(), compiler.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(compiler.calls(), 1);
    assert_eq!(compiler.commands(), vec!["true".to_string()]);

    assert!(tree.read(ALPHA_STUB).contains("alpha"));
    assert!(tree.read(BETA_STUB).contains("beta"));
    assert!(!tree.read(ALPHA_STUB).contains("beta"));

    let sentinel = tree.read(SENTINEL);
    assert!(sentinel.contains("MANIFEST_HASH"));
    assert!(sentinel.contains(r#"MANIFEST_APPS = ["alpha","beta"] as const;"#));

    assert!(tree.exists(DESCRIPTOR));
}

#[tokio::test]
async fn rerun_without_changes_rewrites_nothing_but_still_compiles() {
    init_tracing();
    let tree = ProjectTree::new()
        .app("alpha", &["shared"])
        .app("beta", &["shared"]);
    let compiler = FakeCompiler::new();
    let session = session(Arc::new(RealFileSystem), tree.root(), compiler.clone());

    session.run_once().await.unwrap();
    let before = (
        tree.read(ALPHA_STUB),
        tree.read(BETA_STUB),
        tree.read(SENTINEL),
        tree.read(DESCRIPTOR),
    );
    let sentinel_mtime = mtime(&tree, SENTINEL);
    let descriptor_mtime = mtime(&tree, DESCRIPTOR);

    session.run_once().await.unwrap();
    let after = (
        tree.read(ALPHA_STUB),
        tree.read(BETA_STUB),
        tree.read(SENTINEL),
        tree.read(DESCRIPTOR),
    );

    assert_eq!(before, after);
    assert_eq!(mtime(&tree, SENTINEL), sentinel_mtime);
    assert_eq!(mtime(&tree, DESCRIPTOR), descriptor_mtime);
    assert_eq!(compiler.calls(), 2);
}

#[tokio::test]
async fn first_pass_descriptor_maps_generated_client_dirs() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/apps/alpha/shared/a.ts", "export {};");
    let session = session(Arc::new(fs.clone()), Path::new("/proj"), FakeCompiler::new());

    session.run_once().await.unwrap();

    let text = fs.read_to_string(&Path::new("/proj").join(DESCRIPTOR)).unwrap();
    let descriptor: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        descriptor.pointer("/tree/StarterPlayer/StarterPlayerScripts/Apps/Alpha/$path"),
        Some(&serde_json::Value::from("out/apps/alpha/client"))
    );
}

#[tokio::test]
async fn removed_app_drops_out_of_descriptor_and_sentinel() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/apps/alpha/shared/a.ts", "export {};");
    fs.add_file("/proj/src/apps/beta/shared/b.ts", "export {};");
    let session = session(Arc::new(fs.clone()), Path::new("/proj"), FakeCompiler::new());
    session.run_once().await.unwrap();

    fs.remove("/proj/src/apps/beta");
    fs.clear_writes();
    session.run_once().await.unwrap();

    let root = Path::new("/proj");
    let mut writes = fs.writes();
    writes.sort();
    assert_eq!(writes, vec![root.join(DESCRIPTOR), root.join(SENTINEL)]);
    let descriptor = fs.read_to_string(&root.join(DESCRIPTOR)).unwrap();
    assert!(!descriptor.contains("Beta"));
    let sentinel = fs.read_to_string(&root.join(SENTINEL)).unwrap();
    assert!(sentinel.contains(r#"MANIFEST_APPS = ["alpha"] as const;"#));
}

#[tokio::test]
async fn second_pass_performs_zero_writes() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/apps/alpha/shared/a.ts", "export {};");
    fs.add_file("/proj/src/apps/beta/shared/b.ts", "export {};");
    let compiler = FakeCompiler::new();
    let session = session(Arc::new(fs.clone()), Path::new("/proj"), compiler.clone());

    session.run_once().await.unwrap();
    // Two stubs, the sentinel and the descriptor.
    assert_eq!(fs.write_count(), 4);

    fs.clear_writes();
    session.run_once().await.unwrap();
    assert_eq!(fs.write_count(), 0);
    assert_eq!(compiler.calls(), 2);
}

#[tokio::test]
async fn touching_a_shared_file_rewrites_only_the_sentinel() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/apps/alpha/shared/a.ts", "export {};");
    let session = session(Arc::new(fs.clone()), Path::new("/proj"), FakeCompiler::new());

    session.run_once().await.unwrap();
    fs.clear_writes();

    fs.touch("/proj/src/apps/alpha/shared/a.ts");
    session.run_once().await.unwrap();
    assert_eq!(fs.writes(), vec![Path::new("/proj").join(SENTINEL)]);
}

#[tokio::test]
async fn missing_apps_dir_is_empty_input() {
    let fs = MockFileSystem::new();
    let compiler = FakeCompiler::new();
    let session = session(Arc::new(fs.clone()), Path::new("/proj"), compiler.clone());

    assert_eq!(session.run_once().await.unwrap(), 0);
    assert_eq!(compiler.calls(), 1);
    assert!(fs.is_file(&Path::new("/proj").join(SENTINEL)));
}

#[tokio::test]
async fn non_zero_compiler_exit_is_returned_as_exit_code() {
    let fs = MockFileSystem::new();
    let compiler = FakeCompiler::new().with_exit_code(3);
    let session = session(Arc::new(fs), Path::new("/proj"), compiler);

    assert_eq!(session.run_once().await.unwrap(), 3);
}

#[tokio::test]
async fn unwritable_artifact_fails_the_pass_before_compiling() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/apps/alpha/shared/a.ts", "export {};");
    fs.set_read_only("/proj/src/chisel");
    let compiler = FakeCompiler::new();
    let session = session(Arc::new(fs), Path::new("/proj"), compiler.clone());

    let err = session.run_once().await.unwrap_err();
    assert!(matches!(err, chisel::errors::ChiselError::ArtifactWrite { .. }));
    assert_eq!(compiler.calls(), 0);
}
