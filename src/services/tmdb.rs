/// TMDB API client
///
/// Thin caching proxy over TMDB v3. Every request is shaped before it goes
/// out: the resolved locale supplies `language` and (for discover endpoints)
/// `region` defaults, and the cache key is built from the endpoint plus the
/// serialized parameters, with a region suffix whenever a region participates.
///
/// Upcoming and trending lists get rotation on top: a multi-page pool is
/// cached per region, and a shown-ID set biases each response away from
/// recent repeats.
use std::collections::BTreeMap;

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ListPage, Locale, TrendingKind, TrendingWindow},
    services::rotation,
};

/// Pages merged into the rotation pool for upcoming/trending lists
const POOL_PAGES: u32 = 3;

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
    cache_ttl: u64,
    default_language: String,
}

impl TmdbClient {
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        cache_ttl: u64,
        default_language: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
            cache_ttl,
            default_language,
        }
    }

    /// Applies locale defaults to the query and derives the cache key
    ///
    /// `language` is injected unless the caller set one. `region` is injected
    /// for `/discover/` endpoints only, mirroring TMDB's parameter support.
    /// The BTreeMap keeps the serialized query order stable so equivalent
    /// requests share a key.
    fn shape_request(
        endpoint: &str,
        params: &[(String, String)],
        locale: &Locale,
    ) -> (BTreeMap<String, String>, CacheKey) {
        let mut query: BTreeMap<String, String> = params.iter().cloned().collect();

        if !query.contains_key("language") {
            query.insert("language".to_string(), locale.language.clone());
        }

        if endpoint.starts_with("/discover/") && !query.contains_key("region") {
            query.insert("region".to_string(), locale.region.clone());
        }

        let region = query
            .get("region")
            .or_else(|| query.get("watch_region"))
            .cloned();

        let serialized = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let key = CacheKey::TmdbResponse {
            endpoint: endpoint.to_string(),
            query: serialized,
            region,
        };

        (query, key)
    }

    /// Cached GET against TMDB, passing the JSON payload through unmodified
    async fn request(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        locale: &Locale,
    ) -> AppResult<Value> {
        let (query, key) = Self::shape_request(endpoint, params, locale);
        cached!(
            self.cache,
            key,
            self.cache_ttl,
            self.fetch_json(endpoint, &query)
        )
    }

    /// Uncached GET against TMDB
    async fn fetch_json(
        &self,
        endpoint: &str,
        query: &BTreeMap<String, String>,
    ) -> AppResult<Value> {
        let url = format!("{}{}", self.api_url, endpoint);
        tracing::debug!(url = %url, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "TMDB has no resource at {}",
                endpoint
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, endpoint = %endpoint, "TMDB API error");
            return Err(AppError::Tmdb(format!("TMDB returned status {}", status)));
        }

        Ok(response.json().await?)
    }

    pub async fn discover_movies(
        &self,
        params: Vec<(String, String)>,
        locale: &Locale,
    ) -> AppResult<Value> {
        self.request("/discover/movie", &params, locale).await
    }

    pub async fn discover_tv(
        &self,
        params: Vec<(String, String)>,
        locale: &Locale,
    ) -> AppResult<Value> {
        self.request("/discover/tv", &params, locale).await
    }

    pub async fn search_multi(
        &self,
        query: &str,
        page: u32,
        region: &str,
        locale: &Locale,
    ) -> AppResult<Value> {
        let params = vec![
            ("query".to_string(), query.to_string()),
            ("page".to_string(), page.to_string()),
            ("region".to_string(), region.to_string()),
        ];
        self.request("/search/multi", &params, locale).await
    }

    /// Movie details with credits and watch providers appended
    pub async fn movie_details(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        let params = vec![
            (
                "append_to_response".to_string(),
                "credits,watch/providers".to_string(),
            ),
            ("watch_region".to_string(), locale.region.clone()),
        ];
        self.request(&format!("/movie/{}", id), &params, locale)
            .await
    }

    /// TV show details with credits and watch providers appended
    pub async fn tv_details(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        let params = vec![
            (
                "append_to_response".to_string(),
                "credits,watch/providers".to_string(),
            ),
            ("watch_region".to_string(), locale.region.clone()),
        ];
        self.request(&format!("/tv/{}", id), &params, locale).await
    }

    pub async fn movie_watch_providers(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        let params = vec![("watch_region".to_string(), locale.region.clone())];
        self.request(&format!("/movie/{}/watch/providers", id), &params, locale)
            .await
    }

    pub async fn tv_watch_providers(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        let params = vec![("watch_region".to_string(), locale.region.clone())];
        self.request(&format!("/tv/{}/watch/providers", id), &params, locale)
            .await
    }

    pub async fn movie_genres(&self, locale: &Locale) -> AppResult<Value> {
        self.request("/genre/movie/list", &[], locale).await
    }

    pub async fn tv_genres(&self, locale: &Locale) -> AppResult<Value> {
        self.request("/genre/tv/list", &[], locale).await
    }

    pub async fn movie_videos(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        self.request(&format!("/movie/{}/videos", id), &[], locale)
            .await
    }

    pub async fn tv_videos(&self, id: &str, locale: &Locale) -> AppResult<Value> {
        self.request(&format!("/tv/{}/videos", id), &[], locale)
            .await
    }

    /// Upcoming movies with shown-item rotation
    pub async fn upcoming_movies(&self, locale: &Locale) -> AppResult<ListPage> {
        let pool_key = CacheKey::UpcomingPool {
            region: locale.region.clone(),
        };
        let shown_key = CacheKey::ShownUpcoming {
            region: locale.region.clone(),
        };

        let pool: ListPage = cached!(
            self.cache,
            pool_key,
            self.cache_ttl,
            self.fetch_pool("/movie/upcoming", &[], locale)
        )?;

        self.rotate(&pool, &shown_key).await
    }

    /// Trending titles with shown-item rotation
    pub async fn trending(
        &self,
        kind: TrendingKind,
        window: TrendingWindow,
        locale: &Locale,
    ) -> AppResult<ListPage> {
        let pool_key = CacheKey::TrendingPool {
            kind,
            window,
            region: locale.region.clone(),
        };
        let shown_key = CacheKey::ShownTrending {
            kind,
            window,
            region: locale.region.clone(),
        };

        let endpoint = format!("/trending/{}/{}", kind.as_str(), window.as_str());
        let pool: ListPage = cached!(
            self.cache,
            pool_key,
            self.cache_ttl,
            self.fetch_pool(&endpoint, &[], locale)
        )?;

        self.rotate(&pool, &shown_key).await
    }

    /// Merges the first [`POOL_PAGES`] pages of a list endpoint into one pool
    ///
    /// The pool cache is keyed by region only, so the fetch language is
    /// pinned to the app default: whichever user warms the pool must not
    /// decide the language every other user in the region sees.
    async fn fetch_pool(
        &self,
        endpoint: &str,
        extra_params: &[(String, String)],
        locale: &Locale,
    ) -> AppResult<ListPage> {
        let pool_locale = Locale::new(&self.default_language, &locale.region);
        let mut results = Vec::new();

        for page in 1..=POOL_PAGES {
            let mut query: BTreeMap<String, String> = extra_params.iter().cloned().collect();
            query.insert("language".to_string(), pool_locale.language.clone());
            query.insert("page".to_string(), page.to_string());
            query.insert("region".to_string(), pool_locale.region.clone());

            let value = self.fetch_json(endpoint, &query).await?;
            let list: ListPage = serde_json::from_value(value)
                .map_err(|e| AppError::Internal(format!("Unexpected TMDB list shape: {}", e)))?;
            results.extend(list.results);
        }

        Ok(ListPage { results })
    }

    /// Applies shown-item rotation to a cached pool and persists the new
    /// shown set
    async fn rotate(&self, pool: &ListPage, shown_key: &CacheKey) -> AppResult<ListPage> {
        let shown: Vec<u64> = self.cache.get(shown_key).await.unwrap_or_default();

        let rotation = rotation::pick(&pool.results, &shown, &mut rand::thread_rng());
        if !rotation.selected.is_empty() {
            self.cache.put(shown_key, &rotation.shown_ids, self.cache_ttl);
        }

        tracing::debug!(
            pool = pool.results.len(),
            selected = rotation.selected.len(),
            shown = rotation.shown_ids.len(),
            "Rotation pick"
        );

        Ok(ListPage {
            results: rotation.selected,
        })
    }
}
