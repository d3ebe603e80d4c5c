use serde::Serialize;

use shopfront_core::{DomainError, DomainResult, ProductId};

/// A product as shown in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in smallest currency unit (cents).
    pub price: u64,
    pub images: Vec<String>,
    pub moods: Vec<String>,
    pub stock: u32,
    pub rating: f32,
    pub reviews: u32,
}

/// In-process product catalog.
///
/// The catalog is immutable after construction, so it is shared behind an
/// `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    moods: Vec<String>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, moods: Vec<String>) -> Self {
        Self { products, moods }
    }

    /// The storefront's launch catalog.
    pub fn seeded() -> Self {
        const PLACEHOLDER: &str = "/placeholder.svg?height=300&width=300";

        let p = |id: u32, name: &str, description: &str, price: u64, moods: &[&str], stock: u32, rating: f32, reviews: u32| {
            Product {
                id: ProductId::new(id),
                name: name.to_string(),
                description: description.to_string(),
                price,
                images: vec![PLACEHOLDER.to_string()],
                moods: moods.iter().map(|m| m.to_string()).collect(),
                stock,
                rating,
                reviews,
            }
        };

        let products = vec![
            p(1, "Idea Journal", "A beautiful journal to capture your creative ideas and inspirations.", 1999, &["Creative", "Playful"], 50, 4.5, 28),
            p(2, "Meditation Cushion", "Comfortable cushion for your meditation practice.", 4999, &["Anxious", "Muddled"], 35, 4.8, 42),
            p(3, "Aromatherapy Diffuser", "Essential oil diffuser to create a calming atmosphere.", 3999, &["Anxious", "Fragile"], 20, 4.7, 36),
            p(4, "Weighted Blanket", "Provides comfort and helps reduce anxiety.", 8999, &["Anxious", "Fragile"], 15, 4.9, 54),
            p(5, "Stress Relief Tea", "A soothing blend of herbs to help you relax and unwind.", 1499, &["Anxious", "Muddled"], 200, 4.4, 65),
            p(6, "Watercolor Set", "A premium watercolor set for artists of all levels.", 3499, &["Creative", "Playful"], 60, 4.7, 42),
            p(7, "Color Changing Desk Lamp", "An adjustable desk lamp with color-changing light.", 4999, &["Creative", "Wired"], 40, 4.2, 38),
            p(8, "Fidget Cube", "Keep your hands busy and your mind focused.", 999, &["Anxious", "Wired"], 150, 4.3, 110),
        ];

        let moods = ["Creative", "Anxious", "Fragile", "Playful", "Muddled", "Wired", "Caring", "Open"]
            .iter()
            .map(|m| m.to_string())
            .collect();

        Self::new(products, moods)
    }

    /// All products, optionally filtered by mood (case-insensitive).
    pub fn list(&self, mood: Option<&str>) -> Vec<Product> {
        match mood.map(str::trim).filter(|m| !m.is_empty()) {
            Some(mood) => self
                .products
                .iter()
                .filter(|p| p.moods.iter().any(|m| m.eq_ignore_ascii_case(mood)))
                .cloned()
                .collect(),
            None => self.products.clone(),
        }
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    pub fn moods(&self) -> &[String] {
        &self.moods
    }
}
