use crate::config::{BUSINESS_ID_ATTR, WidgetSettings};
use crate::page::{self, HostPage};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("embedding script tag for {0} not found")]
    ScriptNotFound(String),
    #[error("'data-business-id' is missing from the script tag")]
    MissingBusinessId,
}

/// What the host page told us about itself through the embedding tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub business_id: String,
}

/// Locates the including `<script>` and reads the business identifier off it.
///
/// The including tag is the first script whose `src` file name equals the
/// configured script name; failing that, the first script carrying the
/// business attribute.
pub fn locate_embed(page: &HostPage, settings: &WidgetSettings) -> Result<Embed, BootstrapError> {
    let scripts = page
        .select_all("script")
        .map_err(|_| BootstrapError::ScriptNotFound(settings.script_name.clone()))?;

    let script = scripts
        .iter()
        .find(|s| {
            page::attr(s, "src")
                .map(|src| script_file_name(&src) == settings.script_name)
                .unwrap_or(false)
        })
        .or_else(|| {
            scripts
                .iter()
                .find(|s| page::attr(s, BUSINESS_ID_ATTR).is_some())
        })
        .ok_or_else(|| BootstrapError::ScriptNotFound(settings.script_name.clone()))?;

    let business_id = page::attr(script, BUSINESS_ID_ATTR)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(BootstrapError::MissingBusinessId)?;

    Ok(Embed { business_id })
}

/// Last path segment of a script `src`, without query string or fragment.
fn script_file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}
