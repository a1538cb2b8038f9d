//! Prompt template loading and rendering via `minijinja`.
//!
//! The default templates are compiled into the binary. Operators can point
//! `ORACLE_LLM_TEMPLATES_DIR` at a directory holding their own `system.j2`
//! and `user.j2` to tune the analysis without recompiling.

use std::path::Path;

use minijinja::Environment;
use oracle_core::analyst::AnalysisRequest;
use serde::Serialize;

use crate::error::AnalystError;

const SYSTEM_TEMPLATE: &str = include_str!("../templates/system.j2");
const USER_TEMPLATE: &str = include_str!("../templates/user.j2");

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message describing the analyst role and reply format.
    pub system: String,
    /// User message describing the scenario and its parameters.
    pub user: String,
}

/// Template context for one analysis.
#[derive(Debug, Serialize)]
struct PromptContext<'a> {
    scenario_id: &'a str,
    title: &'a str,
    description: &'a str,
    category: Option<String>,
    parameters: Vec<PromptParameter>,
}

#[derive(Debug, Serialize)]
struct PromptParameter {
    name: String,
    value: String,
    default: Option<String>,
}

impl PromptEngine {
    /// Create a prompt engine over the embedded templates.
    pub fn embedded() -> Result<Self, AnalystError> {
        Self::from_sources(SYSTEM_TEMPLATE.to_owned(), USER_TEMPLATE.to_owned())
    }

    /// Create a prompt engine loading `system.j2` and `user.j2` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, AnalystError> {
        let system = load_template(dir, "system.j2")?;
        let user = load_template(dir, "user.j2")?;
        Self::from_sources(system, user)
    }

    fn from_sources(system: String, user: String) -> Result<Self, AnalystError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| AnalystError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("user", user)
            .map_err(|e| AnalystError::Template(format!("failed to add user template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the system and user messages for `request`.
    pub fn render(&self, request: &AnalysisRequest) -> Result<RenderedPrompt, AnalystError> {
        let context = build_context(request);

        let system = self
            .env
            .get_template("system")
            .map_err(|e| AnalystError::Template(format!("missing system template: {e}")))?
            .render(&context)
            .map_err(|e| AnalystError::Template(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("user")
            .map_err(|e| AnalystError::Template(format!("missing user template: {e}")))?
            .render(&context)
            .map_err(|e| AnalystError::Template(format!("user render failed: {e}")))?;

        Ok(RenderedPrompt { system, user })
    }
}

fn build_context(request: &AnalysisRequest) -> PromptContext<'_> {
    let scenario = request.scenario.as_ref();
    let parameters = request
        .parameters
        .iter()
        .map(|(name, value)| PromptParameter {
            name: name.clone(),
            value: value.normalize().to_string(),
            default: scenario
                .and_then(|s| s.base_parameters.get(name))
                .map(|d| d.normalize().to_string()),
        })
        .collect();

    PromptContext {
        scenario_id: &request.scenario_id,
        title: request.title(),
        description: scenario.map_or("", |s| s.description.as_str()),
        category: scenario
            .and_then(|s| serde_json::to_value(s.category).ok())
            .and_then(|v| v.as_str().map(ToOwned::to_owned)),
        parameters,
    }
}

fn load_template(dir: &Path, filename: &str) -> Result<String, AnalystError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| AnalystError::Template(format!("failed to read {}: {e}", path.display())))
}
