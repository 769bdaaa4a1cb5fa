/// A macro to simplify get-or-compute caching logic.
///
/// Looks the key up in the cache and returns the hit if present. On a miss it
/// runs the provided async block, stores the computed value in the background,
/// and returns it. Cache failures degrade to misses inside `Cache::get`, so
/// the block is the only fallible part.
///
/// # Arguments
/// * `$cache`: The cache instance, with `get` and `put` methods.
/// * `$key`: The `CacheKey` under which the value lives.
/// * `$ttl`: The time-to-live for the stored value, in seconds.
/// * `$block`: The async block computing the value on a miss.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await {
            tracing::debug!(key = %$key, "Cache hit");
            Ok::<_, $crate::error::AppError>(cached)
        } else {
            let value = $block.await?;
            $cache.put(&$key, &value, $ttl);
            Ok::<_, $crate::error::AppError>(value)
        }
    }};
}
