//! Response types for the public storefront `products.json` feed.
//!
//! ### Tags
//! Most stores return tags as a JSON array of strings; older themes return a
//! single comma-separated string. Both shapes decode into `Vec<String>`.
//!
//! ### Malformed products
//! The top-level response keeps each product as raw JSON so that one product
//! with an unexpected shape (null title, string id) does not sink the whole
//! feed; see [`FeedResponse::decode_products`].
//!
//! ### Prices
//! Variant prices arrive as decimal strings (`"30.00"`); a few stores emit
//! bare numbers. Both decode into [`FeedPrice`].

use serde::{Deserialize, Deserializer};

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    pub products: Vec<serde_json::Value>,
}

impl FeedResponse {
    /// Decodes each product independently, in feed order.
    pub fn decode_products(self) -> impl Iterator<Item = Result<FeedProduct, serde_json::Error>> {
        self.products.into_iter().map(serde_json::from_value::<FeedProduct>)
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedProduct {
    /// Numeric product id (e.g., `6789012345678`).
    pub id: i64,

    pub title: String,

    /// URL slug for the product page.
    #[serde(default)]
    pub handle: String,

    /// Raw HTML description. May be `null` or absent.
    #[serde(default)]
    pub body_html: Option<String>,

    /// Free-form product type; empty string is treated as absent.
    #[serde(default)]
    pub product_type: Option<String>,

    #[serde(default, deserialize_with = "tags_from_array_or_csv")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub vendor: Option<String>,

    #[serde(default)]
    pub images: Vec<FeedImage>,

    #[serde(default)]
    pub variants: Vec<FeedVariant>,
}

#[derive(Debug, Deserialize)]
pub struct FeedVariant {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub price: Option<FeedPrice>,

    #[serde(default)]
    pub compare_at_price: Option<FeedPrice>,

    /// Defaults to `true` when absent.
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeedImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A price that may be encoded as a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedPrice {
    Text(String),
    Number(f64),
}

impl FeedPrice {
    /// Parsed value; `None` for unparseable, negative, or non-finite input.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            FeedPrice::Text(text) => crate::parse::parse_decimal(text),
            FeedPrice::Number(n) => Some(*n).filter(|v| v.is_finite() && *v >= 0.0),
        }
    }
}

fn default_available() -> bool {
    true
}

fn tags_from_array_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<String>),
        Csv(String),
        Null(()),
    }

    let tags = match RawTags::deserialize(deserializer)? {
        RawTags::List(list) => list,
        RawTags::Csv(csv) => csv.split(',').map(str::to_owned).collect(),
        RawTags::Null(()) => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_accept_array_and_csv() {
        let from_array: FeedProduct = serde_json::from_str(
            r#"{"id": 1, "title": "A", "tags": ["fitness", " gym "]}"#,
        )
        .unwrap();
        assert_eq!(from_array.tags, vec!["fitness", "gym"]);

        let from_csv: FeedProduct =
            serde_json::from_str(r#"{"id": 1, "title": "A", "tags": "home, kitchen,,"}"#).unwrap();
        assert_eq!(from_csv.tags, vec!["home", "kitchen"]);
    }

    #[test]
    fn null_tags_and_missing_collections_default_empty() {
        let product: FeedProduct =
            serde_json::from_str(r#"{"id": 7, "title": "B", "tags": null}"#).unwrap();
        assert!(product.tags.is_empty());
        assert!(product.images.is_empty());
        assert!(product.variants.is_empty());
    }

    #[test]
    fn price_accepts_string_or_number() {
        let variant: FeedVariant = serde_json::from_str(r#"{"price": "12.50"}"#).unwrap();
        assert_eq!(variant.price.and_then(|p| p.value()), Some(12.5));

        let variant: FeedVariant = serde_json::from_str(r#"{"price": 9}"#).unwrap();
        assert_eq!(variant.price.and_then(|p| p.value()), Some(9.0));
        assert!(variant.available);
    }

    #[test]
    fn malformed_products_fail_individually() {
        let feed: FeedResponse = serde_json::from_str(
            r#"{"products": [
                {"id": 1, "title": "Good"},
                {"id": 2, "title": null},
                {"id": "three", "title": "Bad id"},
                {"id": 4, "title": "Bad image", "images": [{"src": null}]},
                {"id": 5, "title": "Also good"}
            ]}"#,
        )
        .unwrap();

        let decoded: Vec<Result<FeedProduct, serde_json::Error>> = feed.decode_products().collect();
        assert_eq!(decoded.len(), 5);
        let good: Vec<i64> = decoded.iter().filter_map(|p| p.as_ref().ok()).map(|p| p.id).collect();
        assert_eq!(good, vec![1, 5]);
    }

    #[test]
    fn unparseable_price_has_no_value() {
        assert_eq!(FeedPrice::Text("call us".into()).value(), None);
        assert_eq!(FeedPrice::Number(-1.0).value(), None);
    }
}
