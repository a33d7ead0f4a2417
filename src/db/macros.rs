/// Read-through, write-through caching for recommendation results.
///
/// Looks the key up first; on a hit the cached value is returned. On a miss
/// the provided future is awaited (its error propagates with `?`), the result
/// is written back under the same key and returned.
///
/// # Arguments
/// * `$cache`: a [`RecommendationCache`](crate::db::RecommendationCache).
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) for the request.
/// * `$block`: future computing the value on a miss.
///
/// Must be the tail expression of a function returning `AppResult<T>`, so
/// the cached type is inferred from the return type.
///
/// # Example
/// ```rust,ignore
/// async fn recommend(&self, key: CacheKey) -> AppResult<Vec<CatalogEntry>> {
///     cached!(self.cache, key, self.compute())
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set(&$key, &value).await;
            Ok(value)
        }
    }};
}
