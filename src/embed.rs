use crate::config::BUSINESS_ID_ATTR;
use crate::page::{self, PageError};

/// Markup a site owner pastes into their page to embed the widget: the
/// including script tag plus the host container.
pub fn snippet(
    script_url: &str,
    business_id: &str,
    container_id: &str,
) -> Result<String, PageError> {
    let script = page::parse_element("<script defer></script>")?;
    page::set_attr(&script, "src", script_url);
    page::set_attr(&script, BUSINESS_ID_ATTR, business_id);

    let container = page::parse_element("<div></div>")?;
    page::set_attr(&container, "id", container_id);

    Ok(format!("{}\n{}\n", script.to_string(), container.to_string()))
}
