// src/utils.rs

/// Normalize a status string: lowercase, trimmed, `-` and spaces folded to `_`
pub fn normalize_status(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Prefix a server file path with the API base URL unless it is already absolute
pub fn resolve_file_url(base_url: &str, file_url: &str) -> String {
    let lower = file_url.to_lowercase();
    if ["http://", "https://", "data:", "blob:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return file_url.to_string();
    }

    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        file_url.trim_start_matches('/')
    )
}

/// Join the base URL and an endpoint path with exactly one `/`
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / KB / KB)
    }
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
