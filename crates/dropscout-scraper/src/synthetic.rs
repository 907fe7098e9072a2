//! Templated filler records and randomized engagement signals.
//!
//! Every record produced here carries an id starting with
//! [`SYNTHETIC_ID_PREFIX`], so it can always be told apart from extracted
//! data. Extractors also borrow the generator's RNG for jitter and price
//! defaults, which keeps a seeded generator fully deterministic.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{Duration, Utc};
use dropscout_core::{
    round_to, AdMetric, Category, ProductRecord, SupplierPlatform, TrendPoint, TrendSignal,
    VideoMetric, SYNTHETIC_ID_PREFIX,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// A catalog entry the generator varies into concrete records.
#[derive(Debug, Clone, Copy)]
pub struct ProductTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub base_price: f64,
    pub tags: &'static [&'static str],
}

pub const CATALOG: &[ProductTemplate] = &[
    ProductTemplate {
        title: "Smart LED Strip Lights",
        description: "WiFi-enabled LED strip lights with app control and voice assistant compatibility",
        category: Category::Gadgets,
        base_price: 29.99,
        tags: &["smart home", "led", "wifi", "voice control"],
    },
    ProductTemplate {
        title: "Portable Car Vacuum Cleaner",
        description: "Cordless car vacuum with HEPA filter and LED light for thorough cleaning",
        category: Category::Automotive,
        base_price: 39.99,
        tags: &["car", "vacuum", "portable", "cleaning"],
    },
    ProductTemplate {
        title: "Wireless Bluetooth Earbuds",
        description: "True wireless earbuds with noise cancellation and 24-hour battery life",
        category: Category::Gadgets,
        base_price: 49.99,
        tags: &["bluetooth", "earbuds", "wireless", "audio"],
    },
    ProductTemplate {
        title: "Smart Water Bottle with Temperature Display",
        description: "Hydration tracking water bottle with temperature sensor and app connectivity",
        category: Category::Fitness,
        base_price: 34.99,
        tags: &["fitness", "hydration", "smart", "health"],
    },
    ProductTemplate {
        title: "LED Flame Speaker",
        description: "Portable Bluetooth speaker with realistic LED flame effect and 360 degree sound",
        category: Category::Gadgets,
        base_price: 24.99,
        tags: &["speaker", "bluetooth", "led", "flame"],
    },
    ProductTemplate {
        title: "Pet Grooming Kit",
        description: "Complete pet grooming kit with clippers, scissors, and grooming tools",
        category: Category::Pets,
        base_price: 44.99,
        tags: &["pet", "grooming", "clippers", "tools"],
    },
    ProductTemplate {
        title: "Smart Plant Pot",
        description: "Self-watering plant pot with soil moisture sensor and app notifications",
        category: Category::Garden,
        base_price: 39.99,
        tags: &["garden", "smart", "plant", "watering"],
    },
    ProductTemplate {
        title: "Portable Massage Gun",
        description: "Deep tissue massage gun with multiple speed settings and attachments",
        category: Category::Fitness,
        base_price: 54.99,
        tags: &["fitness", "massage", "recovery", "therapy"],
    },
    ProductTemplate {
        title: "Smart Mirror with LED Lights",
        description: "Vanity mirror with adjustable LED lighting and magnification",
        category: Category::Beauty,
        base_price: 29.99,
        tags: &["beauty", "mirror", "led", "vanity"],
    },
    ProductTemplate {
        title: "Kids Educational Tablet",
        description: "Child-safe tablet with educational apps and parental controls",
        category: Category::Kids,
        base_price: 79.99,
        tags: &["kids", "tablet", "educational", "parental control"],
    },
    ProductTemplate {
        title: "Smart Fitness Tracker Watch",
        description: "Heart rate, sleep and step tracking with a week of battery life",
        category: Category::Fitness,
        base_price: 42.50,
        tags: &["fitness", "tracker", "watch", "health"],
    },
    ProductTemplate {
        title: "Protective Phone Case",
        description: "Shock-absorbing phone case with raised edges and a slim profile",
        category: Category::Gadgets,
        base_price: 9.00,
        tags: &["phone", "case", "protection"],
    },
    ProductTemplate {
        title: "Kitchen Gadget Set",
        description: "Space-saving set of peelers, graters and measuring tools",
        category: Category::Home,
        base_price: 23.50,
        tags: &["kitchen", "cooking", "tools"],
    },
    ProductTemplate {
        title: "Car Phone Mount Holder",
        description: "Magnetic dashboard mount with one-hand release",
        category: Category::Automotive,
        base_price: 12.50,
        tags: &["car", "phone", "mount"],
    },
    ProductTemplate {
        title: "Beauty Face Mask Set",
        description: "Hydrating sheet masks for daily skincare routines",
        category: Category::Beauty,
        base_price: 16.50,
        tags: &["beauty", "skincare", "mask"],
    },
    ProductTemplate {
        title: "Yoga Mat with Alignment Lines",
        description: "Non-slip yoga mat with printed alignment guides and carry strap",
        category: Category::Sports,
        base_price: 27.99,
        tags: &["yoga", "fitness", "mat"],
    },
];

const AD_TEMPLATES: &[&str] = &[
    "{} is AMAZING! You won't believe this!",
    "Limited time offer on {}!",
    "{} - The best purchase I've ever made!",
    "Don't miss out on {}!",
    "{} - Game changer!",
    "{} - Must have item!",
    "{} - 5-star reviews!",
];

const VIDEO_TEMPLATES: &[&str] = &[
    "This {} is so cool!",
    "Just got my {}! Love it!",
    "{} review - must have!",
    "Best purchase ever - {}!",
    "Can't live without my {}!",
    "{} is amazing!",
    "Unboxing {}!",
];

const VIDEO_HASHTAGS: &[&str] = &["#dropshipping", "#product", "#review", "#trending"];

const COMPETITOR_STORES: &[&str] = &[
    "gymshark.com",
    "kyliecosmetics.com",
    "allbirds.com",
    "glossier.com",
    "awaytravel.com",
    "ring.com",
    "onepeloton.com",
    "warbyparker.com",
    "casper.com",
    "bombas.com",
];

const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/400/300";

/// Likelihood and price ratio of a supplier listing per platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplierOdds {
    pub platform: SupplierPlatform,
    pub probability: f64,
    /// Supplier price as a fraction of the retail price.
    pub price_ratio: (f64, f64),
}

/// Ranges the generator draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSettings {
    pub price_variation: (f64, f64),
    pub compare_markup: (f64, f64),
    pub suppliers: Vec<SupplierOdds>,
    pub ads_per_record: (usize, usize),
    pub mentions_per_record: (usize, usize),
    pub trend_score: (u32, u32),
    pub similar_stores: (usize, usize),
    pub max_age_days: i64,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            price_variation: (0.8, 1.2),
            compare_markup: (1.3, 2.0),
            suppliers: vec![
                SupplierOdds {
                    platform: SupplierPlatform::AliExpress,
                    probability: 0.7,
                    price_ratio: (0.3, 0.6),
                },
                SupplierOdds {
                    platform: SupplierPlatform::Temu,
                    probability: 0.5,
                    price_ratio: (0.4, 0.7),
                },
                SupplierOdds {
                    platform: SupplierPlatform::Shop1688,
                    probability: 0.2,
                    price_ratio: (0.25, 0.5),
                },
            ],
            ads_per_record: (1, 4),
            mentions_per_record: (0, 6),
            trend_score: (30, 95),
            similar_stores: (0, 8),
            max_age_days: 30,
        }
    }
}

/// Randomized social and trend signals for one product title.
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub facebook_ads: Vec<AdMetric>,
    pub tiktok_mentions: Vec<VideoMetric>,
    pub trend_data: TrendSignal,
}

impl Engagement {
    pub fn apply_to(self, record: &mut ProductRecord) {
        record.facebook_ads = self.facebook_ads;
        record.tiktok_mentions = self.tiktok_mentions;
        record.trend_data = Some(self.trend_data);
    }
}

pub struct SyntheticRecordGenerator {
    settings: SyntheticSettings,
    rng: Mutex<StdRng>,
}

impl SyntheticRecordGenerator {
    #[must_use]
    pub fn new(settings: SyntheticSettings) -> Self {
        Self {
            settings,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic generator for tests and reproducible runs.
    #[must_use]
    pub fn with_seed(settings: SyntheticSettings, seed: u64) -> Self {
        Self {
            settings,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SyntheticSettings {
        &self.settings
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform draw from `[low, high)`; returns `low` for an empty range.
    pub fn uniform(&self, low: f64, high: f64) -> f64 {
        self.with_rng(|rng| uniform_f64(rng, (low, high)))
    }

    /// Placeholder image URL for listings without one.
    pub fn placeholder_image(&self) -> String {
        let n: u32 = self.with_rng(|rng| rng.random_range(1..=1000));
        format!("{PLACEHOLDER_IMAGE_BASE}?random={n}")
    }

    /// Generic filler records attributed to anonymous stores.
    pub fn fill(&self, count: usize) -> Vec<ProductRecord> {
        let records: Vec<ProductRecord> = (0..count)
            .map(|_| {
                self.with_rng(|rng| {
                    let store = format!("store-{}.com", rng.random_range(1..=10));
                    self.generate(rng, "filler", &store, None)
                })
            })
            .collect();
        tracing::debug!(count = records.len(), "generated synthetic filler");
        records
    }

    /// Fallback records for a source that produced too little.
    ///
    /// When `supplier` is set every record lists that platform as a supplier
    /// in addition to the randomly drawn ones.
    pub fn batch_for(
        &self,
        source_store: &str,
        supplier: Option<SupplierPlatform>,
        count: usize,
    ) -> Vec<ProductRecord> {
        let label = source_label(source_store);
        let records: Vec<ProductRecord> = (0..count)
            .map(|_| self.with_rng(|rng| self.generate(rng, &label, source_store, supplier)))
            .collect();
        tracing::debug!(
            source = source_store,
            count = records.len(),
            "generated synthetic fallback batch"
        );
        records
    }

    /// Randomized ads, video mentions and trend data echoing `title`.
    pub fn engagement_for(&self, title: &str) -> Engagement {
        self.with_rng(|rng| self.engagement(rng, title))
    }

    fn generate(
        &self,
        rng: &mut StdRng,
        label: &str,
        source_store: &str,
        guaranteed_supplier: Option<SupplierPlatform>,
    ) -> ProductRecord {
        let template = CATALOG.choose(rng).copied().unwrap_or(CATALOG[0]);
        let s = &self.settings;

        let price = round_to(template.base_price * uniform_f64(rng, s.price_variation), 2);
        let suffix = uuid::Builder::from_random_bytes(rng.random()).into_uuid();
        let id = format!(
            "{SYNTHETIC_ID_PREFIX}{label}_{}",
            &suffix.simple().to_string()[..12]
        );

        let mut record = ProductRecord::new(id, template.title, price, template.category, source_store);
        record.description = Some(template.description.to_owned());
        record.compare_price = Some(round_to(price * uniform_f64(rng, s.compare_markup), 2));
        record.tags = template.tags.iter().map(|t| (*t).to_owned()).collect();
        record.image_url = Some(format!(
            "{PLACEHOLDER_IMAGE_BASE}?random={}",
            rng.random_range(1..=1000)
        ));
        record.source_url = Some(format!(
            "https://{source_store}/products/{}",
            suffix.simple()
        ));

        for odds in &s.suppliers {
            let listed = guaranteed_supplier == Some(odds.platform)
                || rng.random_bool(odds.probability.clamp(0.0, 1.0));
            if listed {
                add_supplier(rng, &mut record, odds.platform, odds.price_ratio);
            }
        }
        if let Some(platform) = guaranteed_supplier {
            if !record.supplier_prices.contains_key(&platform) {
                add_supplier(rng, &mut record, platform, (0.3, 0.6));
            }
        }

        let competitors = uniform_count(rng, s.similar_stores).min(COMPETITOR_STORES.len());
        record.similar_stores = COMPETITOR_STORES
            .choose_multiple(rng, competitors)
            .map(|store| (*store).to_owned())
            .collect();

        self.engagement(rng, template.title).apply_to(&mut record);

        let age_days = rng.random_range(1..=s.max_age_days.max(1));
        record.created_at = Utc::now() - Duration::days(age_days);
        record
    }

    fn engagement(&self, rng: &mut StdRng, title: &str) -> Engagement {
        let s = &self.settings;

        let facebook_ads = (0..uniform_count(rng, s.ads_per_record))
            .map(|_| {
                let reach: u64 = rng.random_range(5_000..=100_000);
                let engagement_rate = round_to(rng.random_range(0.02..0.08), 4);
                // Share of engaged reach that leaves a visible interaction.
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let interactions =
                    (reach as f64 * engagement_rate * rng.random_range(0.2..0.6)).round() as u64;
                AdMetric {
                    id: format!("ad_{}", rng.random_range(1000..=9999)),
                    text: fill_template(AD_TEMPLATES.choose(rng).copied(), title),
                    engagement_rate,
                    reach,
                    impressions: rng.random_range(8_000..=150_000),
                    clicks: rng.random_range(200..=3_000),
                    spend: Some(round_to(rng.random_range(100.0..2000.0), 2)),
                    likes: interactions * 7 / 10,
                    comments: interactions * 2 / 10,
                    shares: interactions / 10,
                }
            })
            .collect();

        let tiktok_mentions = (0..uniform_count(rng, s.mentions_per_record))
            .map(|_| VideoMetric {
                id: format!("video_{}", rng.random_range(10_000..=99_999)),
                url: format!(
                    "https://tiktok.com/@user{}/video/{}",
                    rng.random_range(1..=1000),
                    rng.random_range(100_000..=999_999)
                ),
                description: fill_template(VIDEO_TEMPLATES.choose(rng).copied(), title),
                views: rng.random_range(10_000..=500_000),
                likes: rng.random_range(500..=10_000),
                shares: rng.random_range(100..=2_000),
                comments: rng.random_range(50..=1_000),
                hashtags: VIDEO_HASHTAGS.iter().map(|h| (*h).to_owned()).collect(),
            })
            .collect();

        let keyword = title.to_lowercase();
        let (low, high) = s.trend_score;
        let trend_score = if low < high {
            rng.random_range(low..=high)
        } else {
            low
        };
        let today = Utc::now().date_naive();
        let interest_over_time = (0..3i64)
            .rev()
            .map(|days_back| TrendPoint {
                date: today - Duration::days(days_back),
                value: rng.random_range(20..=90),
            })
            .collect();
        let geographic_interest = BTreeMap::from([
            ("US".to_owned(), rng.random_range(50..=100)),
            ("CA".to_owned(), rng.random_range(20..=90)),
            ("UK".to_owned(), rng.random_range(20..=90)),
            ("AU".to_owned(), rng.random_range(20..=90)),
        ]);

        Engagement {
            facebook_ads,
            tiktok_mentions,
            trend_data: TrendSignal {
                related_queries: vec![
                    format!("best {keyword}"),
                    format!("{keyword} review"),
                    format!("buy {keyword}"),
                    format!("{keyword} price"),
                ],
                keyword,
                trend_score: f64::from(trend_score),
                interest_over_time,
                geographic_interest,
            },
        }
    }
}

impl Default for SyntheticRecordGenerator {
    fn default() -> Self {
        Self::new(SyntheticSettings::default())
    }
}

fn add_supplier(
    rng: &mut StdRng,
    record: &mut ProductRecord,
    platform: SupplierPlatform,
    price_ratio: (f64, f64),
) {
    let item = rng.random_range(100_000..=999_999);
    let link = match platform {
        SupplierPlatform::AliExpress => format!("https://www.aliexpress.com/item/{item}.html"),
        SupplierPlatform::Temu => format!("https://www.temu.com/goods-{item}.html"),
        SupplierPlatform::Shop1688 => format!("https://detail.1688.com/offer/{item}.html"),
    };
    record.supplier_links.insert(platform, link);
    record
        .supplier_prices
        .insert(platform, round_to(record.price * uniform_f64(rng, price_ratio), 2));
}

/// `"aliexpress.com"` → `"aliexpress"`; anything non-alphanumeric becomes `_`.
fn source_label(source_store: &str) -> String {
    let head = source_store.split('.').next().unwrap_or(source_store);
    let label: String = head
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if label.is_empty() {
        "source".to_owned()
    } else {
        label
    }
}

fn fill_template(template: Option<&str>, title: &str) -> String {
    template.unwrap_or("{}").replace("{}", title)
}

fn uniform_f64(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    if low < high {
        rng.random_range(low..high)
    } else {
        low
    }
}

fn uniform_count(rng: &mut StdRng, (low, high): (usize, usize)) -> usize {
    if low < high {
        rng.random_range(low..=high)
    } else {
        low
    }
}
