// List registered template helpers

use stencil_templates::TemplateEngine;

use super::Command;
use crate::error::CliResult;

/// List registered helper names
pub struct HelpersCommand;

impl HelpersCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpersCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for HelpersCommand {
    fn execute(&self, engine: &TemplateEngine) -> CliResult<String> {
        let mut out = String::new();
        for name in engine.helpers().names() {
            out.push_str(&name);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_builtins() {
        let out = HelpersCommand::new().execute(&TemplateEngine::new()).unwrap();
        let names: Vec<&str> = out.lines().collect();
        assert!(names.contains(&"snakeCase"));
        assert!(names.contains(&"join"));
        assert_eq!(names.len(), 18);
    }
}
