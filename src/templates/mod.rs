//! HTML templates
//!
//! Pages are rendered with Tera. The templates under `templates/` are
//! compiled into the binary; when `templates.path` is configured, files
//! found there replace the embedded ones with the same name.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::User;

mod error;

pub use error::TemplateError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Tera engine over the embedded templates plus optional overrides
pub struct TemplateEngine {
    tera: Tera,
}

/// Variables every page gets
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageVars {
    /// Logged-in user, `None` for anonymous visitors
    pub current_user: Option<User>,
    /// Path of the current request, used by the login link
    pub request_path: String,
}

impl PageVars {
    pub fn new(current_user: Option<User>, request_path: impl Into<String>) -> Self {
        Self {
            current_user,
            request_path: request_path.into(),
        }
    }
}

impl TemplateEngine {
    /// Load the embedded templates, then apply overrides from
    /// `override_dir` if given. A missing override directory is not an
    /// error.
    pub fn new(override_dir: Option<&Path>) -> Result<Self> {
        let mut templates = collect_embedded()?;

        if let Some(dir) = override_dir {
            if dir.is_dir() {
                let mut overrides = BTreeMap::new();
                collect_from_dir(dir, dir, &mut overrides)?;
                tracing::info!(
                    path = %dir.display(),
                    count = overrides.len(),
                    "Loaded template overrides"
                );
                templates.extend(overrides);
            } else {
                tracing::warn!(path = %dir.display(), "Template override directory not found");
            }
        }

        let mut tera = Tera::default();
        // Adding all at once lets Tera resolve `extends` regardless of order
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Render(error_chain("Failed to load templates", &e)))?;

        Ok(Self { tera })
    }

    /// Engine with the embedded templates only
    pub fn embedded() -> Result<Self> {
        Self::new(None)
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            TemplateError::Render(error_chain(&format!("Failed to render '{}'", template), &e))
                .into()
        })
    }

    /// Render a page, adding `current_user` and `request_path` to `context`
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &PageVars,
    ) -> Result<String> {
        let mut full_context = context.clone();
        full_context.insert("current_user", &vars.current_user);
        full_context.insert("request_path", &vars.request_path);
        self.render(template, &full_context)
    }

    /// Names of all loaded templates, sorted
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

fn error_chain(prefix: &str, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn collect_embedded() -> Result<BTreeMap<String, String>> {
    let mut templates = BTreeMap::new();
    for name in EmbeddedTemplates::iter() {
        let Some(file) = EmbeddedTemplates::get(&name) else {
            continue;
        };
        let content = String::from_utf8(file.data.into_owned()).map_err(|e| TemplateError::Load {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        templates.insert(name.to_string(), content);
    }
    Ok(templates)
}

fn collect_from_dir(
    base: &Path,
    current: &Path,
    templates: &mut BTreeMap<String, String>,
) -> Result<()> {
    for entry in fs::read_dir(current).map_err(TemplateError::from)? {
        let path = entry.map_err(TemplateError::from)?.path();

        if path.is_dir() {
            collect_from_dir(base, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative = path.strip_prefix(base).map_err(|e| TemplateError::Load {
                name: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let name = relative.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.insert(name, content);
        }
    }
    Ok(())
}
