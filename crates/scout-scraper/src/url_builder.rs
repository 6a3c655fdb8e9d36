use crate::definition::PlatformDefinition;
use url::form_urlencoded;

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.trim().as_bytes()).collect()
}

/// Fill the definition's search template with the encoded query and location.
///
/// Templates without placeholders (Stack Overflow, Dev.to) come back unchanged.
#[must_use]
pub fn build_search_url(definition: &PlatformDefinition, query: &str, location: &str) -> String {
    definition
        .search
        .url_template
        .replace("{query}", &encode(query))
        .replace("{location}", &encode(location))
}
