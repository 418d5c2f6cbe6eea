//! Strict-undefined template rendering.
//!
//! Templates use minijinja syntax: `{{ variable }}` substitution plus the
//! basic control constructs (`{% if %}`, `{% for %}`). Binding is strict —
//! a variable the template references but the caller did not supply is a
//! hard [`Error::MissingVariables`], never an empty substitution.

use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::store::Definition;

/// Render a definition's template body against the supplied variables.
///
/// Pure function of `(template body, variables)`: no registry access, no
/// side effects. Fails with [`Error::MissingVariables`] naming every
/// top-level variable the template references but `variables` lacks, or
/// [`Error::Template`] on a syntax fault.
pub fn render(definition: &Definition, variables: &Map<String, Value>) -> Result<String, Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let template = env.template_from_str(&definition.template)?;

    let mut missing: Vec<String> = template
        .undeclared_variables(false)
        .into_iter()
        .filter(|name| !variables.contains_key(name))
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(Error::MissingVariables { variables: missing });
    }

    // Strict mode keeps nested lookups (`{{ user.name }}` on a map without
    // `name`) hard errors as well.
    Ok(template.render(variables)?)
}
