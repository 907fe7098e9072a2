//! Normalization from storefront feed products to [`ProductRecord`].

use dropscout_core::{round_to, ProductRecord};

use crate::client::{extract_store_origin, store_label};
use crate::error::ScraperError;
use crate::parse::{category_from_storefront, strip_html, truncate_chars, MAX_DESCRIPTION_CHARS};
use crate::placeholder::feed_score;
use crate::types::FeedProduct;

pub const FEED_ID_PREFIX: &str = "shopify_";
pub const MAX_FEED_TAGS: usize = 10;

/// Markup applied to a single-priced product to estimate its compare price.
const SINGLE_PRICE_COMPARE_MARKUP: f64 = 1.5;

/// Normalizes a feed product from `store_url` into a [`ProductRecord`]
/// carrying a placeholder score.
///
/// `jitter` is added to the placeholder estimate before clamping.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] if the product has no title or no variant
/// with a usable price.
pub fn normalize_feed_product(
    product: FeedProduct,
    store_url: &str,
    jitter: f64,
) -> Result<ProductRecord, ScraperError> {
    let title = product.title.trim();
    if title.is_empty() {
        return Err(ScraperError::Parse {
            context: format!("feed product {}", product.id),
            reason: "empty title".into(),
        });
    }

    let prices: Vec<f64> = product
        .variants
        .iter()
        .filter_map(|variant| variant.price.as_ref().and_then(|p| p.value()))
        .collect();
    let (Some(min_price), Some(max_price)) = (
        prices.iter().copied().reduce(f64::min),
        prices.iter().copied().reduce(f64::max),
    ) else {
        return Err(ScraperError::Parse {
            context: format!("feed product {}", product.id),
            reason: "no variant with a usable price".into(),
        });
    };
    let compare_price = if prices.len() > 1 {
        max_price
    } else {
        min_price * SINGLE_PRICE_COMPARE_MARKUP
    };

    let product_type = product.product_type.as_deref().filter(|s| !s.trim().is_empty());
    let category = category_from_storefront(&product.tags, product_type);

    let mut record = ProductRecord::new(
        format!("{FEED_ID_PREFIX}{}", product.id),
        title,
        round_to(min_price, 2),
        category,
        store_label(store_url),
    );
    record.compare_price = Some(round_to(compare_price, 2));

    record.description = product
        .body_html
        .as_deref()
        .map(strip_html)
        .filter(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS));

    if !product.handle.is_empty() {
        record.source_url = Some(format!(
            "{}/products/{}",
            extract_store_origin(store_url),
            product.handle
        ));
    }
    record.image_url = product.images.first().map(|image| image.src.clone());
    record.tags = product.tags.iter().take(MAX_FEED_TAGS).cloned().collect();

    record.set_placeholder_score(feed_score(
        min_price,
        product.images.len(),
        product.tags.len(),
        product.variants.len(),
        jitter,
    ));

    Ok(record)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
