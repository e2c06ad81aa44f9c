//! Catalog projection.
//!
//! Flattens backend products into the shape the storefront serves: one
//! price in the selling currency, a pre-computed discount percentage, and
//! an image URL that always resolves to something displayable.

use serde::Serialize;

use jarsy_core::{CurrencyCode, Price, ProductId};

use crate::commerce::{Product, ProductVariant};

/// Fallback image for products without any imagery.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/800x600.png";

/// A product flattened for display.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: Option<String>,
    /// Display title.
    pub title: String,
    /// Plain text description.
    pub description: Option<String>,
    /// Current selling price.
    pub price: Price,
    /// Pre-discount price, when the variant carries more than one price
    /// tier in the selling currency.
    pub original_price: Option<Price>,
    /// Whole-number discount percentage, when discounted.
    pub discount_percent: Option<u8>,
    /// Image URL, never empty.
    pub image_url: String,
    /// Primary category or collection name.
    pub category: String,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl ProductView {
    /// Project a backend product for the given selling currency.
    #[must_use]
    pub fn from_product(product: &Product, currency: CurrencyCode) -> Self {
        let (amount, original) = product
            .variants
            .first()
            .map_or((None, None), |variant| price_tiers(variant, currency));

        let price = Price::new(amount.unwrap_or(0), currency);
        let original_price = original.map(|amount| Price::new(amount, currency));
        let discount_percent = discount_percent(price.amount, original);

        let image_url = product
            .thumbnail
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| product.images.first().map(|image| image.url.clone()))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        let category = product
            .categories
            .first()
            .map(|category| category.name.clone())
            .or_else(|| {
                product
                    .collection
                    .as_ref()
                    .and_then(|collection| collection.title.clone())
            })
            .unwrap_or_else(|| "General".to_string());

        Self {
            id: product.id.clone(),
            handle: product.handle.clone(),
            title: product.title.clone().unwrap_or_default(),
            description: product.description.clone(),
            price,
            original_price,
            discount_percent,
            image_url,
            category,
            tags: product.tags.iter().map(|tag| tag.value.clone()).collect(),
        }
    }
}

/// A purchasable variant flattened for display.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    /// Variant ID, passed back to cart mutations.
    pub id: jarsy_core::VariantId,
    /// Variant title.
    pub title: Option<String>,
    /// Current selling price.
    pub price: Price,
}

/// Project a product's variants for the given selling currency.
#[must_use]
pub fn variant_views(product: &Product, currency: CurrencyCode) -> Vec<VariantView> {
    product
        .variants
        .iter()
        .map(|variant| {
            let (amount, _) = price_tiers(variant, currency);
            VariantView {
                id: variant.id.clone(),
                title: variant.title.clone(),
                price: Price::new(amount.unwrap_or(0), currency),
            }
        })
        .collect()
}

/// Lowest and highest price in the selling currency.
///
/// The lowest tier is what the shopper pays; a higher tier, when present,
/// is the struck-through original price.
fn price_tiers(variant: &ProductVariant, currency: CurrencyCode) -> (Option<i64>, Option<i64>) {
    let mut amounts: Vec<i64> = variant
        .prices
        .iter()
        .filter(|price| price.currency_code == currency.code())
        .map(|price| price.amount)
        .collect();
    amounts.sort_unstable();

    match amounts.as_slice() {
        [] => (None, None),
        [only] => (Some(*only), None),
        [lowest, .., highest] if lowest == highest => (Some(*lowest), None),
        [lowest, .., highest] => (Some(*lowest), Some(*highest)),
    }
}

fn discount_percent(price: i64, original: Option<i64>) -> Option<u8> {
    let original = original?;
    if original <= price || original <= 0 {
        return None;
    }
    let percent = ((original - price) * 100 + original / 2) / original;
    u8::try_from(percent).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jarsy_core::VariantId;

    use crate::commerce::{ProductCategory, ProductCollection, ProductImage, VariantPrice};

    use super::*;

    fn product_with_prices(prices: Vec<VariantPrice>) -> Product {
        Product {
            id: ProductId::new("prod_01"),
            handle: Some("amber-jar".to_string()),
            title: Some("Amber Jar".to_string()),
            description: Some("A jar.".to_string()),
            thumbnail: None,
            images: Vec::new(),
            variants: vec![ProductVariant {
                id: VariantId::new("variant_01"),
                title: Some("Default".to_string()),
                prices,
            }],
            categories: Vec::new(),
            collection: None,
            tags: Vec::new(),
        }
    }

    fn inr(amount: i64) -> VariantPrice {
        VariantPrice {
            currency_code: "inr".to_string(),
            amount,
        }
    }

    #[test]
    fn test_single_price_has_no_discount() {
        let product = product_with_prices(vec![inr(15000)]);
        let view = ProductView::from_product(&product, CurrencyCode::Inr);

        assert_eq!(view.price, Price::new(15000, CurrencyCode::Inr));
        assert_eq!(view.original_price, None);
        assert_eq!(view.discount_percent, None);
    }

    #[test]
    fn test_two_tiers_compute_discount() {
        let product = product_with_prices(vec![inr(20000), inr(15000)]);
        let view = ProductView::from_product(&product, CurrencyCode::Inr);

        assert_eq!(view.price, Price::new(15000, CurrencyCode::Inr));
        assert_eq!(view.original_price, Some(Price::new(20000, CurrencyCode::Inr)));
        assert_eq!(view.discount_percent, Some(25));
    }

    #[test]
    fn test_other_currencies_are_ignored() {
        let product = product_with_prices(vec![
            inr(15000),
            VariantPrice {
                currency_code: "usd".to_string(),
                amount: 999,
            },
        ]);
        let view = ProductView::from_product(&product, CurrencyCode::Inr);

        assert_eq!(view.price.amount, 15000);
        assert_eq!(view.original_price, None);
    }

    #[test]
    fn test_image_fallback_chain() {
        let mut product = product_with_prices(vec![inr(100)]);
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).image_url,
            PLACEHOLDER_IMAGE
        );

        product.images = vec![ProductImage {
            url: "https://cdn.example.com/a.png".to_string(),
        }];
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).image_url,
            "https://cdn.example.com/a.png"
        );

        product.thumbnail = Some("https://cdn.example.com/thumb.png".to_string());
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).image_url,
            "https://cdn.example.com/thumb.png"
        );
    }

    #[test]
    fn test_category_falls_back_to_collection_then_general() {
        let mut product = product_with_prices(vec![inr(100)]);
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).category,
            "General"
        );

        product.collection = Some(ProductCollection {
            title: Some("Kitchen".to_string()),
        });
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).category,
            "Kitchen"
        );

        product.categories = vec![ProductCategory {
            id: Some("pcat_01".to_string()),
            name: "Jars".to_string(),
        }];
        assert_eq!(
            ProductView::from_product(&product, CurrencyCode::Inr).category,
            "Jars"
        );
    }

    #[test]
    fn test_no_price_in_currency_yields_zero() {
        let product = product_with_prices(Vec::new());
        let view = ProductView::from_product(&product, CurrencyCode::Inr);
        assert_eq!(view.price, Price::zero(CurrencyCode::Inr));
    }
}
