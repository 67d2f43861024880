use crate::types::Primitive;

// Strict and reserved keywords; none of them can name a generated member.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

#[must_use]
pub fn is_reserved(ident: &str) -> bool {
    RESERVED_WORDS.contains(&ident)
}

/// `UpperCamelCase`, ASCII, not a primitive name.
pub fn check_type_ident(ident: &str, max_len: usize) -> Result<(), String> {
    check_len(ident, max_len)?;

    let mut chars = ident.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
        return Err(format!("type ident '{ident}' must start with an uppercase letter"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("type ident '{ident}' must be alphanumeric"));
    }
    if Primitive::from_name(ident).is_some() {
        return Err(format!("type ident '{ident}' shadows a primitive"));
    }

    Ok(())
}

/// `snake_case`, ASCII, not reserved.
pub fn check_member_ident(ident: &str, max_len: usize) -> Result<(), String> {
    check_len(ident, max_len)?;

    let mut chars = ident.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_') {
        return Err(format!("ident '{ident}' must start with a lowercase letter"));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(format!("ident '{ident}' must be snake_case"));
    }
    if is_reserved(ident) {
        return Err(format!("ident '{ident}' is a reserved word"));
    }

    Ok(())
}

pub fn check_package_segment(segment: &str) -> Result<(), String> {
    check_member_ident(segment, usize::MAX).map_err(|e| format!("package: {e}"))
}

fn check_len(ident: &str, max_len: usize) -> Result<(), String> {
    if ident.is_empty() {
        return Err("ident is empty".to_string());
    }
    if ident.len() > max_len {
        return Err(format!("ident '{ident}' exceeds {max_len} characters"));
    }

    Ok(())
}
