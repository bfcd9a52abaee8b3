/// URL slug for a stop name: drops anything that isn't alphanumeric or whitespace, joins the
/// words with `-` and lower-cases the result.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Canonical detail-view path for a stop.
pub fn stop_href(code: &str, name: &str) -> String {
    let slug = slugify(name);
    format!(
        "/stops/{}/{}",
        urlencoding::encode(code),
        if slug.is_empty() { "stop" } else { slug.as_str() }
    )
}
