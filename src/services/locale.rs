use axum::http::{header, HeaderMap};

use crate::models::Locale;

/// Header carrying an explicit locale override, e.g. `X-Locale: fr-FR`
pub const LOCALE_HEADER: &str = "x-locale";

/// Cookie name carrying a remembered locale choice
pub const LOCALE_COOKIE: &str = "locale";

/// Resolves the request locale from request signals
///
/// First match wins, in this order: the `X-Locale` header, the `locale` query
/// parameter, the `locale` cookie, the `Accept-Language` header, and finally
/// the configured application default. Tags that do not parse are skipped
/// rather than partially applied.
pub fn resolve(headers: &HeaderMap, query_locale: Option<&str>, app_default: &Locale) -> Locale {
    let default_region = app_default.region.as_str();

    if let Some(locale) = headers
        .get(LOCALE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|tag| Locale::from_tag(tag, default_region))
    {
        return locale;
    }

    if let Some(locale) = query_locale.and_then(|tag| Locale::from_tag(tag, default_region)) {
        return locale;
    }

    if let Some(locale) =
        cookie_value(headers, LOCALE_COOKIE).and_then(|tag| Locale::from_tag(&tag, default_region))
    {
        return locale;
    }

    if let Some(locale) = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| best_accept_language(value, default_region))
    {
        return locale;
    }

    app_default.clone()
}

/// Extracts a cookie value from the `Cookie` header
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (cookie_name, value) = pair.trim().split_once('=')?;
        (cookie_name.trim() == name).then(|| value.trim().to_string())
    })
}

/// Picks the best usable locale from an `Accept-Language` header value
///
/// Entries are weighted by their `q` parameter (default 1.0) and tried in
/// descending quality order; wildcard and malformed entries are skipped. Ties
/// keep the order the client sent.
fn best_accept_language(value: &str, default_region: &str) -> Option<Locale> {
    let mut candidates: Vec<(f32, &str)> = Vec::new();

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or("").trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let quality = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        if quality <= 0.0 {
            continue;
        }

        candidates.push((quality, tag));
    }

    // Stable sort keeps client order among equal weights
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    candidates
        .into_iter()
        .find_map(|(_, tag)| Locale::from_tag(tag, default_region))
}
