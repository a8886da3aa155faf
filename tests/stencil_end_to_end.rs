//! End-to-end tests over the bundled templates
//!
//! Drives the command-line router the same way the `stencil` binary does
//! and checks the rendered output of `templates/`.

use std::path::PathBuf;

use clap::Parser;
use stencil_cli::{Cli, CliError, CommandRouter};
use stencil_templates::{TemplateContext, TemplateEngine, TemplateLoader};

fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn run(args: &[&str]) -> Result<String, CliError> {
    let cli = Cli::try_parse_from(args).unwrap();
    CommandRouter::route(&cli.command, &TemplateEngine::new())
}

#[test]
fn test_rust_cli_project_files() {
    let project = TemplateLoader::new()
        .load_project(&templates_dir().join("rust-cli/template.yaml"))
        .unwrap();
    assert!(project.supports("rust-bin"));
    assert!(!project.supports("python"));

    let context = TemplateContext::new()
        .with_value("name", "Demo Tool")
        .with_value(
            "commands",
            serde_json::json!([
                {"name": "init", "description": "Create a workspace"},
                {"name": "sync all", "description": "Synchronise everything"}
            ]),
        );
    let files = project.render_files(&TemplateEngine::new(), &context).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "demo-tool/Cargo.toml",
            "demo-tool/src/main.rs",
            "demo-tool/tests/cli.rs",
            "demo-tool/scripts/release.sh",
        ]
    );

    let manifest = &files[0].content;
    assert!(manifest.contains("name = \"demo-tool\""));
    assert!(manifest.contains("authors = [\"Unknown Author\"]"));
    assert!(manifest.contains("[dependencies]\nanyhow = \"1.0\"\nclap = \"4.4\"\n"));

    let main = &files[1].content;
    assert!(main.starts_with("//! Demo Tool\n"));
    assert!(main.contains("    /// Create a workspace\n    Init,\n"));
    assert!(main.contains("    /// Synchronise everything\n    SyncAll\n}"));

    assert!(files[2].content.contains("fn demo_tool_runs()"));

    let release = &files[3];
    assert_eq!(release.mode(), Some(0o755));
    assert!(release.content.contains("Released under the MIT license, (c) 20"));
    assert!(!files.iter().any(|f| f.content.contains("{{")));
}

#[test]
fn test_rust_cli_optional_files() {
    let project = TemplateLoader::new()
        .load_project(&templates_dir().join("rust-cli/template.yaml"))
        .unwrap();
    let context = TemplateContext::new()
        .with_value("name", "ci_only")
        .with_value("withTests", false)
        .with_value("withCi", true);

    let files = project.render_files(&TemplateEngine::new(), &context).unwrap();
    assert!(files.iter().any(|f| f.path == "ci-only/.github/workflows/ci.yml"));
    assert!(!files.iter().any(|f| f.path.ends_with("tests/cli.rs")));
}

#[test]
fn test_entity_template_with_context_document() {
    let dir = templates_dir().join("entities");
    let out = run(&[
        "stencil",
        "render",
        dir.join("entity.rs.tmpl").to_str().unwrap(),
        "--context",
        dir.join("context.yaml").to_str().unwrap(),
    ])
    .unwrap();

    assert!(out.starts_with("//! UserAccount entity\n"));
    assert!(out.contains("/// A registered user\n"));
    assert!(out.contains("pub struct UserAccount {\n    pub user_id: u64,\n    pub display_name: String\n}"));
    assert!(out.contains("/// Create a new user account\n"));
    assert!(out.contains("            user_id,\n            display_name\n        }"));
}

#[test]
fn test_entity_template_without_builder() {
    let dir = templates_dir().join("entities");
    let out = run(&[
        "stencil",
        "render",
        dir.join("entity.rs.tmpl").to_str().unwrap(),
        "--context",
        dir.join("context.yaml").to_str().unwrap(),
        "--set",
        "withBuilder=false",
    ])
    .unwrap();
    assert!(!out.contains("impl UserAccount"));
}

#[test]
fn test_bundled_templates_validate() {
    let entity = templates_dir().join("entities/entity.rs.tmpl");
    let out = run(&["stencil", "validate", entity.to_str().unwrap()]).unwrap();
    assert!(out.contains("ok: "));
    assert!(!out.contains("warning:"));

    let project = TemplateLoader::new()
        .load_project(&templates_dir().join("rust-cli/template.yaml"))
        .unwrap();
    let engine = TemplateEngine::new();
    for file in &project.files {
        let result = engine.validate(&file.template);
        assert!(result.is_valid(), "{}: {:?}", file.path, result.errors());
    }
}

#[test]
fn test_project_dry_run_through_router() {
    let document = templates_dir().join("rust-cli/template.yaml");
    let out = run(&[
        "stencil",
        "project",
        document.to_str().unwrap(),
        "--set",
        "name=Demo Tool",
        "--type",
        "rust-cli",
    ])
    .unwrap();
    assert!(out.starts_with("rust-cli 1.0.0 (4 file(s))\n"));
    assert!(out.contains("  demo-tool/scripts/release.sh [755]\n"));

    let err = run(&["stencil", "project", document.to_str().unwrap()]).unwrap_err();
    assert!(err.user_message().contains("name"));
}
