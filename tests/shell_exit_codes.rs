// tests/shell_exit_codes.rs
#![cfg(unix)]

use std::sync::Arc;

use chisel::exec::ShellCompiler;
use chisel::fs::{FileSystem, RealFileSystem};
use chisel::project::{ProjectPublisher, RojoProjectPublisher};
use chisel::watch::WatchSession;
use chisel_test_utils::builders::{ConfigBuilder, ProjectTree};
use chisel_test_utils::init_tracing;

async fn one_shot(tree: &ProjectTree, cmd: &str) -> i32 {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cfg = ConfigBuilder::new().compile_cmd(cmd).build_arc(tree.root());
    let publisher: Arc<dyn ProjectPublisher> =
        Arc::new(RojoProjectPublisher::from_config(fs.clone(), &cfg));
    WatchSession::new(cfg, fs, publisher, ShellCompiler)
        .unwrap()
        .run_once()
        .await
        .unwrap()
}

#[tokio::test]
async fn compiler_exit_code_three_is_propagated() {
    init_tracing();
    let tree = ProjectTree::new().app("alpha", &["shared"]);
    assert_eq!(one_shot(&tree, "exit 3").await, 3);
}

#[tokio::test]
async fn successful_compile_exits_zero() {
    let tree = ProjectTree::new().app("alpha", &["server"]);
    assert_eq!(one_shot(&tree, "true").await, 0);
}

#[tokio::test]
async fn signal_termination_is_a_failure() {
    let tree = ProjectTree::new();
    assert_eq!(one_shot(&tree, "kill -TERM $$").await, 128 + 15);
}

#[tokio::test]
async fn compile_runs_after_artifacts_are_written() {
    let tree = ProjectTree::new().app("alpha", &["shared"]);
    let code = one_shot(
        &tree,
        &format!(
            "test -f '{}'",
            tree.path("src/apps/alpha/client/gen/index.client.ts").display()
        ),
    )
    .await;
    assert_eq!(code, 0);
}
