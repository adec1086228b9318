//! Attribute filtering for the HTML sanitizer

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// One attribute: name, then an optional quoted or bare value.
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'=/>]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#).expect("Invalid regex")
});

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&#(x[0-9a-f]+|[0-9]+);?").expect("Invalid regex"));

/// Attributes whose value is dereferenced as a URL
const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "xlink:href",
    "background",
    "poster",
    "cite",
    "data",
];

/// Attributes dropped regardless of value
const BLOCKED_ATTRIBUTES: &[&str] = &["srcdoc"];

const DANGEROUS_SCHEMES: &[&str] = &["javascript:", "vbscript:", "livescript:"];

/// Animation attributes that supply the value written to `attributeName`
const ANIMATION_VALUE_ATTRIBUTES: &[&str] = &["values", "to", "from", "by"];

/// Rebuild an attribute list, dropping event handlers and unsafe URLs.
///
/// Kept attributes retain their original quoting. The result starts with a
/// space when non-empty so it can be appended directly to a tag name.
pub(super) fn filter_attributes(raw: &str, allow_data_images: bool) -> String {
    let attributes: Vec<Captures> = ATTRIBUTE.captures_iter(raw).collect();

    // SVG <animate>/<set> targeting a URL attribute carry the URL in their values
    let animates_url = attributes.iter().any(|caps| {
        caps[1].eq_ignore_ascii_case("attributename")
            && caps
                .get(2)
                .is_some_and(|m| URL_ATTRIBUTES.contains(&normalize(unquote(m.as_str())).as_str()))
    });

    let mut kept = String::new();
    for caps in &attributes {
        let name = caps[1].to_ascii_lowercase();
        let value = caps.get(2).map(|m| unquote(m.as_str()));

        let allowed = if animates_url && ANIMATION_VALUE_ATTRIBUTES.contains(&name.as_str()) {
            value.is_none_or(|v| v.split(';').all(|url| is_safe_url(url, allow_data_images)))
        } else {
            attribute_allowed(&name, value, allow_data_images)
        };

        if !allowed {
            tracing::debug!(attribute = %name, "Dropping unsafe attribute");
            continue;
        }

        kept.push(' ');
        kept.push_str(&caps[0]);
    }
    kept
}

fn attribute_allowed(name: &str, value: Option<&str>, allow_data_images: bool) -> bool {
    if name.starts_with("on") || BLOCKED_ATTRIBUTES.contains(&name) {
        return false;
    }

    let Some(value) = value else {
        return true;
    };

    if URL_ATTRIBUTES.contains(&name) {
        return is_safe_url(value, allow_data_images);
    }

    if name == "style" {
        let normalized = normalize(value);
        return !(normalized.contains("expression(")
            || normalized.contains("url(javascript")
            || normalized.contains("behavior:")
            || normalized.contains("-moz-binding"));
    }

    true
}

/// Whether a URL attribute value may be kept.
///
/// Entities are decoded and whitespace/control characters removed before the
/// scheme check, so `jav&#x09;ascript:` is caught.
pub(super) fn is_safe_url(value: &str, allow_data_images: bool) -> bool {
    let normalized = normalize(value);

    if DANGEROUS_SCHEMES.iter().any(|s| normalized.starts_with(s)) {
        return false;
    }

    if normalized.starts_with("data:") {
        return allow_data_images
            && normalized.starts_with("data:image/")
            && !normalized.starts_with("data:image/svg");
    }

    true
}

fn normalize(value: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(value, |caps: &Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix(|c: char| c.eq_ignore_ascii_case(&'x')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    decoded
        .replace("&colon;", ":")
        .replace("&Tab;", "")
        .replace("&NewLine;", "")
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}
