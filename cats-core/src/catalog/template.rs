//! Template accessors for catalog-declared derivations
//!
//! Templates are identity strings with `{key}` placeholders filled from the
//! context: `/home/{filesystem}/files` under `{filesystem=ourfs}` yields
//! `/home/ourfs/files`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::Context;
use crate::derivation::{Accessor, AccessorResult};
use crate::error::CatsError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("placeholder pattern is valid"));

/// Accessor rendering identity templates against the context
#[derive(Debug, Clone, Default)]
pub struct TemplateAccessor {
    /// Templates used when no per-lookup list applies
    templates: Vec<String>,
    /// Templates per traversal lookup name
    by_lookup: BTreeMap<String, Vec<String>>,
}

impl TemplateAccessor {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
            by_lookup: BTreeMap::new(),
        }
    }

    /// Use `templates` when resolution was triggered by lookup name `name`
    pub fn for_lookup<I, S>(mut self, name: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_lookup
            .insert(name.into(), templates.into_iter().map(Into::into).collect());
        self
    }

    /// Placeholder keys used by any template, sorted and deduplicated
    pub fn placeholders(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .templates
            .iter()
            .chain(self.by_lookup.values().flatten())
            .flat_map(|t| PLACEHOLDER.captures_iter(t).map(|c| c[1].to_string()))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn render(template: &str, context: &Context) -> Result<String, CatsError> {
        let mut missing = None;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            match context.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => {
                    if missing.is_none() {
                        missing = Some(caps[1].to_string());
                    }
                    String::new()
                }
            }
        });

        match missing {
            Some(key) => Err(CatsError::MissingContextKey { key }),
            None => Ok(rendered.into_owned()),
        }
    }
}

impl Accessor for TemplateAccessor {
    fn derive(&self, context: &Context, lookup_name: Option<&str>) -> AccessorResult {
        let templates = lookup_name
            .and_then(|name| self.by_lookup.get(name))
            .unwrap_or(&self.templates);

        templates
            .iter()
            .map(|t| Self::render(t, context).map_err(Into::into))
            .collect()
    }
}
