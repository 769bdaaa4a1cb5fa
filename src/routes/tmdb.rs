use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{ListPage, Locale, TrendingKind, TrendingWindow},
    services::locale,
    state::AppState,
};

/// Query parameters shared by handlers that only need a locale override
#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    locale: Option<String>,
}

/// Validated pass-through parameters for the discover endpoints
///
/// Dotted names follow TMDB's filter syntax (`vote_average.gte` etc.); the
/// mood-quiz client drives the runtime and date-range filters.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    locale: Option<String>,
    sort_by: Option<String>,
    with_genres: Option<String>,
    primary_release_year: Option<i32>,
    first_air_date_year: Option<i32>,
    #[serde(rename = "vote_average.gte")]
    vote_average_gte: Option<f64>,
    with_watch_providers: Option<String>,
    #[serde(rename = "with_runtime.gte")]
    with_runtime_gte: Option<u32>,
    #[serde(rename = "with_runtime.lte")]
    with_runtime_lte: Option<u32>,
    #[serde(rename = "primary_release_date.gte")]
    primary_release_date_gte: Option<String>,
    #[serde(rename = "primary_release_date.lte")]
    primary_release_date_lte: Option<String>,
    #[serde(rename = "first_air_date.gte")]
    first_air_date_gte: Option<String>,
    #[serde(rename = "first_air_date.lte")]
    first_air_date_lte: Option<String>,
    watch_region: Option<String>,
    region: Option<String>,
    page: Option<u32>,
}

/// Current localization settings as resolved for this request
pub async fn localization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LocaleQuery>,
) -> Json<Locale> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    Json(locale)
}

pub async fn discover_movies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DiscoverQuery>,
) -> AppResult<Json<Value>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let shaped = build_discover_params(params, &locale)?;
    let data = state.tmdb.discover_movies(shaped, &locale).await?;
    Ok(Json(data))
}

pub async fn discover_tv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DiscoverQuery>,
) -> AppResult<Json<Value>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let shaped = build_discover_params(params, &locale)?;
    let data = state.tmdb.discover_tv(shaped, &locale).await?;
    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    locale: Option<String>,
    query: String,
    page: Option<u32>,
    region: Option<String>,
}

pub async fn search_multi(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Value>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());

    let query = params.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let page = params.page.unwrap_or(1);
    validate_page(page)?;

    let region = match params.region {
        Some(region) => {
            validate_region_code(&region)?;
            region.to_ascii_uppercase()
        }
        None => locale.region.clone(),
    };

    let data = state.tmdb.search_multi(query, page, &region, &locale).await?;
    Ok(Json(data))
}

pub async fn movie_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "movie")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.movie_details(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn tv_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "TV show")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.tv_details(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn movie_watch_providers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "movie")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.movie_watch_providers(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn tv_watch_providers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "TV show")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.tv_watch_providers(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn movie_genres(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.movie_genres(&locale).await?;
    Ok(Json(data))
}

pub async fn tv_genres(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.tv_genres(&locale).await?;
    Ok(Json(data))
}

pub async fn movie_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "movie")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.movie_videos(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn tv_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<Value>> {
    validate_media_id(&id, "TV show")?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let data = state.tmdb.tv_videos(&id, &locale).await?;
    Ok(Json(data))
}

pub async fn upcoming_movies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<ListPage>> {
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let page = state.tmdb.upcoming_movies(&locale).await?;
    Ok(Json(page))
}

pub async fn trending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, window)): Path<(String, String)>,
    Query(params): Query<LocaleQuery>,
) -> AppResult<Json<ListPage>> {
    let kind: TrendingKind = kind.parse()?;
    let window: TrendingWindow = window.parse()?;
    let locale = locale::resolve(&headers, params.locale.as_deref(), &state.default_locale());
    let page = state.tmdb.trending(kind, window, &locale).await?;
    Ok(Json(page))
}

/// Validates and flattens discover parameters, applying the region mirroring
/// rules
///
/// `watch_region` stands in for a missing `region`; a missing `region` falls
/// back to the resolved locale; and requesting watch providers without a
/// `watch_region` reuses the effective region.
fn build_discover_params(
    params: DiscoverQuery,
    locale: &Locale,
) -> AppResult<Vec<(String, String)>> {
    if let Some(region) = params.region.as_deref() {
        validate_region_code(region)?;
    }
    if let Some(watch_region) = params.watch_region.as_deref() {
        validate_region_code(watch_region)?;
    }
    if let Some(vote) = params.vote_average_gte {
        if !(0.0..=10.0).contains(&vote) {
            return Err(AppError::InvalidInput(format!(
                "vote_average.gte must be between 0 and 10, got {}",
                vote
            )));
        }
    }
    let page = params.page.unwrap_or(1);
    validate_page(page)?;

    let watch_region = params.watch_region.map(|r| r.to_ascii_uppercase());
    let region = params
        .region
        .map(|r| r.to_ascii_uppercase())
        .or_else(|| watch_region.clone())
        .unwrap_or_else(|| locale.region.clone());
    let watch_region = watch_region.or_else(|| {
        params
            .with_watch_providers
            .is_some()
            .then(|| region.clone())
    });

    let mut shaped: Vec<(String, String)> = Vec::new();
    push_opt(&mut shaped, "sort_by", params.sort_by);
    push_opt(&mut shaped, "with_genres", params.with_genres);
    push_opt(
        &mut shaped,
        "primary_release_year",
        params.primary_release_year.map(|y| y.to_string()),
    );
    push_opt(
        &mut shaped,
        "first_air_date_year",
        params.first_air_date_year.map(|y| y.to_string()),
    );
    push_opt(
        &mut shaped,
        "vote_average.gte",
        params.vote_average_gte.map(|v| v.to_string()),
    );
    push_opt(&mut shaped, "with_watch_providers", params.with_watch_providers);
    push_opt(
        &mut shaped,
        "with_runtime.gte",
        params.with_runtime_gte.map(|r| r.to_string()),
    );
    push_opt(
        &mut shaped,
        "with_runtime.lte",
        params.with_runtime_lte.map(|r| r.to_string()),
    );
    push_opt(
        &mut shaped,
        "primary_release_date.gte",
        params.primary_release_date_gte,
    );
    push_opt(
        &mut shaped,
        "primary_release_date.lte",
        params.primary_release_date_lte,
    );
    push_opt(&mut shaped, "first_air_date.gte", params.first_air_date_gte);
    push_opt(&mut shaped, "first_air_date.lte", params.first_air_date_lte);
    push_opt(&mut shaped, "watch_region", watch_region);
    shaped.push(("region".to_string(), region));
    shaped.push(("page".to_string(), page.to_string()));

    Ok(shaped)
}

fn push_opt(params: &mut Vec<(String, String)>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        params.push((name.to_string(), value));
    }
}

/// TMDB media IDs are plain decimal integers
fn validate_media_id(id: &str, kind: &str) -> AppResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(format!("Invalid {} ID '{}'", kind, id)));
    }
    Ok(())
}

/// Expects an ISO 3166-1 alpha-2 code
fn validate_region_code(code: &str) -> AppResult<()> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid region code '{}', expected two-letter ISO 3166-1",
            code
        )));
    }
    Ok(())
}

/// TMDB caps pagination at 500 pages
fn validate_page(page: u32) -> AppResult<()> {
    if !(1..=500).contains(&page) {
        return Err(AppError::InvalidInput(format!(
            "page must be between 1 and 500, got {}",
            page
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale() -> Locale {
        Locale::new("en", "US")
    }

    fn get<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_validate_media_id() {
        assert!(validate_media_id("550", "movie").is_ok());
        assert!(validate_media_id("", "movie").is_err());
        assert!(validate_media_id("550; DROP TABLE", "movie").is_err());
        assert!(validate_media_id("tt1375666", "movie").is_err());
    }

    #[test]
    fn test_validate_region_code() {
        assert!(validate_region_code("US").is_ok());
        assert!(validate_region_code("fr").is_ok());
        assert!(validate_region_code("USA").is_err());
        assert!(validate_region_code("U1").is_err());
    }

    #[test]
    fn test_validate_page_bounds() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(500).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_page(501).is_err());
    }

    #[test]
    fn test_discover_defaults_region_to_locale() {
        let shaped = build_discover_params(DiscoverQuery::default(), &locale()).unwrap();
        assert_eq!(get(&shaped, "region"), Some("US"));
        assert_eq!(get(&shaped, "watch_region"), None);
        assert_eq!(get(&shaped, "page"), Some("1"));
    }

    #[test]
    fn test_discover_watch_region_stands_in_for_region() {
        let params = DiscoverQuery {
            watch_region: Some("gb".to_string()),
            ..Default::default()
        };
        let shaped = build_discover_params(params, &locale()).unwrap();
        assert_eq!(get(&shaped, "region"), Some("GB"));
        assert_eq!(get(&shaped, "watch_region"), Some("GB"));
    }

    #[test]
    fn test_discover_providers_pull_in_watch_region() {
        let params = DiscoverQuery {
            region: Some("DE".to_string()),
            with_watch_providers: Some("8|337".to_string()),
            ..Default::default()
        };
        let shaped = build_discover_params(params, &locale()).unwrap();
        assert_eq!(get(&shaped, "watch_region"), Some("DE"));
        assert_eq!(get(&shaped, "with_watch_providers"), Some("8|337"));
    }

    #[test]
    fn test_discover_no_watch_region_without_providers() {
        let params = DiscoverQuery {
            region: Some("DE".to_string()),
            ..Default::default()
        };
        let shaped = build_discover_params(params, &locale()).unwrap();
        assert_eq!(get(&shaped, "watch_region"), None);
    }

    #[test]
    fn test_discover_rejects_out_of_range_vote() {
        let params = DiscoverQuery {
            vote_average_gte: Some(11.0),
            ..Default::default()
        };
        assert!(build_discover_params(params, &locale()).is_err());
    }

    #[test]
    fn test_discover_rejects_bad_region() {
        let params = DiscoverQuery {
            region: Some("USA".to_string()),
            ..Default::default()
        };
        assert!(build_discover_params(params, &locale()).is_err());
    }

    #[test]
    fn test_discover_passes_quiz_filters_through() {
        let params = DiscoverQuery {
            with_genres: Some("35".to_string()),
            with_runtime_gte: Some(60),
            with_runtime_lte: Some(120),
            primary_release_date_gte: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        let shaped = build_discover_params(params, &locale()).unwrap();
        assert_eq!(get(&shaped, "with_genres"), Some("35"));
        assert_eq!(get(&shaped, "with_runtime.gte"), Some("60"));
        assert_eq!(get(&shaped, "with_runtime.lte"), Some("120"));
        assert_eq!(get(&shaped, "primary_release_date.gte"), Some("2024-01-01"));
    }
}
