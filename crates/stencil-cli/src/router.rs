// Command-line parsing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stencil_templates::TemplateEngine;
use tracing::debug;

use crate::{
    commands::{Command, HelpersCommand, ProjectCommand, RenderCommand, ValidateCommand},
    error::CliResult,
};

/// stencil - render and validate templates
#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(bin_name = "stencil")]
#[command(about = "Render and validate stencil templates")]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Engine configuration file (default: <config dir>/stencil/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Context options shared by rendering commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// JSON or YAML document with context values
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Set a context value (KEY=VALUE, VALUE parsed as JSON when possible)
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Set a custom-namespace value (KEY=VALUE)
    #[arg(long = "custom", value_name = "KEY=VALUE")]
    pub custom_values: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check template files without rendering them
    Validate {
        /// Template files
        #[arg(value_name = "TEMPLATE", required = true)]
        templates: Vec<PathBuf>,
    },

    /// Render a template file to stdout
    Render {
        /// Template file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Validate first and refuse to render on errors
        #[arg(long)]
        strict: bool,
    },

    /// Render a project template document without writing anything
    Project {
        /// Project template document (.yaml, .yml or .json)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Require the template to support this project type
        #[arg(long = "type", value_name = "TYPE")]
        project_type: Option<String>,

        /// Print rendered file contents as well as paths
        #[arg(long)]
        show_content: bool,
    },

    /// List registered helpers
    Helpers,
}

/// Dispatches parsed commands to their handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Run the selected command and return its output
    pub fn route(command: &Commands, engine: &TemplateEngine) -> CliResult<String> {
        let result = Self::dispatch(command, engine);

        let stats = engine.cache_stats();
        debug!(
            entries = stats.size,
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Template cache statistics"
        );
        result
    }

    fn dispatch(command: &Commands, engine: &TemplateEngine) -> CliResult<String> {
        match command {
            Commands::Validate { templates } => ValidateCommand::new(templates.clone()).execute(engine),
            Commands::Render {
                template,
                context,
                strict,
            } => RenderCommand {
                template: template.clone(),
                context: context.context.clone(),
                values: context.values.clone(),
                custom_values: context.custom_values.clone(),
                strict: *strict,
            }
            .execute(engine),
            Commands::Project {
                document,
                context,
                project_type,
                show_content,
            } => ProjectCommand {
                document: document.clone(),
                context: context.context.clone(),
                values: context.values.clone(),
                custom_values: context.custom_values.clone(),
                project_type: project_type.clone(),
                show_content: *show_content,
            }
            .execute(engine),
            Commands::Helpers => HelpersCommand::new().execute(engine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_sets() {
        let cli = Cli::try_parse_from([
            "stencil", "render", "t.tmpl", "--set", "a=1", "-s", "b=two", "--custom", "c=3", "--strict", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Render {
                template,
                context,
                strict,
            } => {
                assert_eq!(template, PathBuf::from("t.tmpl"));
                assert_eq!(context.values, vec!["a=1", "b=two"]);
                assert_eq!(context.custom_values, vec!["c=3"]);
                assert!(strict);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["stencil", "validate"]).is_err());
    }

    #[test]
    fn test_route_helpers() {
        let out = CommandRouter::route(&Commands::Helpers, &TemplateEngine::new()).unwrap();
        assert!(out.contains("pascalCase"));
    }
}
