//! Cache Key Module
//!
//! Deterministic cache key construction from (category, identifier, params).
//!
//! Keys are built as `category:identifier:name=value:...` with params sorted
//! by name, so the same logical request always yields the same key no matter
//! the insertion order of its parameters. Structural characters inside
//! components are percent-escaped so component boundaries cannot be forged
//! by crafted values.

// == Key Generation ==
/// Builds the canonical cache key for a logical request.
///
/// Pure and side-effect-free: equal inputs (up to param ordering) always
/// produce equal keys, and distinct identifiers always produce distinct
/// keys.
pub fn generate_key(category: &str, identifier: &str, params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)));

    let mut parts = Vec::with_capacity(2 + sorted.len());
    parts.push(escape_component(category));
    parts.push(escape_component(identifier));
    for (name, value) in sorted {
        parts.push(format!(
            "{}={}",
            escape_component(name),
            escape_component(value)
        ));
    }

    parts.join(":")
}

/// Escapes the characters that carry structure inside a key.
///
/// '%' must be escaped first so the escape output itself stays unambiguous.
fn escape_component(component: &str) -> String {
    component
        .replace('%', "%25")
        .replace(':', "%3A")
        .replace('=', "%3D")
}
