//! Per-platform search profiles: queries, URL template, selector chains and
//! pricing defaults for the query-scrape source.

use dropscout_core::{SearchPlatform, SupplierPlatform};

/// Platform yield below which a synthetic batch tops the source up.
pub const DEFAULT_MIN_YIELD: usize = 5;

/// One step in the ordered extraction plan for a search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Treat every element matching this CSS selector as a listing card.
    Selector(&'static str),
    /// Emit a synthetic batch when no selector produced candidates.
    SyntheticFallback,
}

/// Static description of how to scrape one search platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    pub platform: SearchPlatform,
    /// URL prefix the percent-encoded query is appended to.
    pub search_url: &'static str,
    pub queries: &'static [&'static str],
    pub containers: &'static [&'static str],
    pub titles: &'static [&'static str],
    pub prices: &'static [&'static str],
    pub images: &'static [&'static str],
    /// Image attributes, in preference order.
    pub image_attrs: &'static [&'static str],
    /// Substrings identifying the platform's own image CDN.
    pub image_hosts: &'static [&'static str],
    pub links: &'static [&'static str],
    /// Card attribute holding the platform's product id, if any.
    pub native_id_attr: Option<&'static str>,
    /// Product page prefix used with `native_id_attr`.
    pub product_url: Option<&'static str>,
    /// Price range drawn from when a card has no parseable price.
    pub default_price: (f64, f64),
    pub compare_markup: (f64, f64),
    /// Supplier platform and the supplier-to-retail price ratio.
    pub supplier: Option<(SupplierPlatform, f64)>,
    pub description_prefix: &'static str,
    pub min_yield: usize,
}

const ALIEXPRESS: PlatformProfile = PlatformProfile {
    platform: SearchPlatform::Aliexpress,
    search_url: "https://www.aliexpress.com/wholesale?SearchText=",
    queries: &["wireless earbuds", "smart watch", "phone case", "kitchen gadgets"],
    containers: &[
        "div[data-product-id]",
        ".product-item",
        ".list-item",
        "[data-ae_object_value]",
        ".JIIxO",
        ".manhattan--container--1lP57Ag",
        ".list--gallery--C2f2tvm",
    ],
    titles: &[
        "a[title]",
        ".product-title",
        ".item-title",
        "h3",
        "h4",
        "[data-ae_object_value]",
        ".manhattan--titleText--WccSjUS",
        ".multi--titleText--nXeOvyr",
    ],
    prices: &[
        ".price-current",
        ".price",
        "[data-ae_object_value*=\"price\"]",
        ".JIIxO ._3npa3",
        ".multi--price-sale--U-S0jtj",
        ".manhattan--price-sale--1CCSZfK",
    ],
    images: &[
        "img[src*=\"ae01\"]",
        "img[data-src]",
        "img[src]",
        ".product-image img",
        ".manhattan--image--1lP57Ag img",
        ".multi--image--1lP57Ag img",
    ],
    image_attrs: &["src", "data-src"],
    image_hosts: &["ae01", "alicdn"],
    links: &["a[href*=\"/item/\"]", "a[href*=\"product\"]", "a[href]"],
    native_id_attr: None,
    product_url: None,
    default_price: (5.0, 50.0),
    compare_markup: (1.3, 2.0),
    supplier: Some((SupplierPlatform::AliExpress, 0.6)),
    description_prefix: "High-quality product from AliExpress: ",
    min_yield: DEFAULT_MIN_YIELD,
};

const TEMU: PlatformProfile = PlatformProfile {
    platform: SearchPlatform::Temu,
    search_url: "https://www.temu.com/search.html?search_key=",
    queries: &["trending", "best seller", "gadgets", "smart home"],
    containers: &["[data-testid*=\"product\"]", ".product-card", ".item-card"],
    titles: &[
        "[data-testid*=\"title\"]",
        ".product-title",
        ".item-title",
        "h3",
        "h4",
        "[class*=\"title\"]",
    ],
    prices: &["[data-testid*=\"price\"]", ".price", "[class*=\"price\"]", ".currency"],
    images: &["img[src*=\"img.temu\"]", "img[data-src]", "img[src]", ".product-image img"],
    image_attrs: &["src", "data-src"],
    image_hosts: &["img.temu"],
    links: &["a[href]"],
    native_id_attr: None,
    product_url: None,
    default_price: (5.0, 50.0),
    compare_markup: (1.2, 1.8),
    supplier: Some((SupplierPlatform::Temu, 0.7)),
    description_prefix: "Trending product from Temu: ",
    min_yield: DEFAULT_MIN_YIELD,
};

const AMAZON: PlatformProfile = PlatformProfile {
    platform: SearchPlatform::Amazon,
    search_url: "https://www.amazon.com/s?k=",
    queries: &["trending gadgets", "best seller electronics"],
    containers: &[
        "[data-component-type=\"s-search-result\"]",
        ".s-result-item",
        "[data-asin]",
        ".zg-item",
        ".product-card",
    ],
    titles: &[
        "h2 a span",
        ".a-text-normal",
        "[data-cy=\"title-recipe\"]",
        "h3",
        ".a-link-normal",
    ],
    prices: &[
        ".a-price-whole",
        ".a-price .a-offscreen",
        ".a-price-current",
        "[data-a-color=\"price\"]",
    ],
    images: &[
        "img[data-old-hires]",
        "img[src*=\"images/I\"]",
        "img[data-src]",
        "img[src]",
        ".s-image",
    ],
    image_attrs: &["data-old-hires", "src", "data-src"],
    image_hosts: &["images/I"],
    links: &["h2 a[href]", "a.a-link-normal[href]", "a[href]"],
    native_id_attr: Some("data-asin"),
    product_url: Some("https://www.amazon.com/dp/"),
    default_price: (20.0, 200.0),
    compare_markup: (1.1, 1.5),
    supplier: None,
    description_prefix: "Best seller from Amazon: ",
    min_yield: DEFAULT_MIN_YIELD,
};

impl PlatformProfile {
    #[must_use]
    pub fn for_platform(platform: SearchPlatform) -> Self {
        match platform {
            SearchPlatform::Aliexpress => ALIEXPRESS,
            SearchPlatform::Temu => TEMU,
            SearchPlatform::Amazon => AMAZON,
        }
    }

    /// Container selectors in order, ending with the synthetic fallback.
    #[must_use]
    pub fn strategies(&self) -> Vec<ExtractionStrategy> {
        self.containers
            .iter()
            .copied()
            .map(ExtractionStrategy::Selector)
            .chain(std::iter::once(ExtractionStrategy::SyntheticFallback))
            .collect()
    }

    /// Store label recorded on this platform's records.
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        match self.platform {
            SearchPlatform::Aliexpress => "aliexpress.com",
            SearchPlatform::Temu => "temu.com",
            SearchPlatform::Amazon => "amazon.com",
        }
    }

    /// Records per query so that all queries together reach `cap`.
    #[must_use]
    pub fn per_query_cap(&self, cap: usize) -> usize {
        cap.div_ceil(self.queries.len().max(1))
    }
}
