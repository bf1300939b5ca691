//! AI-assisted listing content: the generator seam, the curator prompt, and the
//! normalization applied to whatever the model returns.

pub mod gemini;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::ShippingInfo;

pub use gemini::GeminiGenerator;

pub const DEFAULT_TITLE: &str = "Unique Handmade Item";
pub const DEFAULT_CATEGORY: &str = "Crafts";
pub const DEFAULT_SUGGESTED_PRICE: &str = "₹299";
pub const DEFAULT_STOCK_COUNT: i32 = 10;
pub const MAX_TAGS: usize = 10;

#[derive(Debug, Clone)]
pub struct ImageInput {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Structured listing content as produced by the generator, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedListing {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: String,
    pub suggested_price: String,
    pub story: String,
    pub features: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub in_stock: bool,
    pub stock_count: i32,
    pub shipping_info: ShippingInfo,
    pub fallback_used: bool,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator is not configured: {0}")]
    NotConfigured(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generator returned no content")]
    EmptyResponse,
    #[error("generator returned invalid JSON: {0}")]
    Parse(String),
}

#[async_trait]
pub trait ListingGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        transcription: &str,
        images: &[ImageInput],
    ) -> Result<GeneratedListing, GenerationError>;
}

/// Runs the generator and degrades to [`fallback_listing`] on any failure.
pub async fn generate_or_fallback(
    generator: &dyn ListingGenerator,
    transcription: &str,
    images: &[ImageInput],
) -> GeneratedListing {
    match generator.generate(transcription, images).await {
        Ok(listing) => listing,
        Err(err) => {
            tracing::warn!(
                error = %err,
                model = generator.model_name(),
                "listing generation failed, using fallback"
            );
            fallback_listing(transcription)
        }
    }
}

pub fn fallback_listing(transcription: &str) -> GeneratedListing {
    let excerpt: String = transcription.chars().take(100).collect();
    GeneratedListing {
        title: DEFAULT_TITLE.to_string(),
        description: format!(
            "Beautiful handcrafted item created with care and attention to detail. {transcription}"
        ),
        tags: ["Handmade", "Unique", "Creative", "Artisan", "Custom"]
            .into_iter()
            .map(String::from)
            .collect(),
        category: DEFAULT_CATEGORY.to_string(),
        suggested_price: DEFAULT_SUGGESTED_PRICE.to_string(),
        story: format!(
            "This piece represents the creator's passion for handmade craftsmanship. {excerpt}..."
        ),
        features: Vec::new(),
        specifications: BTreeMap::new(),
        in_stock: true,
        stock_count: DEFAULT_STOCK_COUNT,
        shipping_info: ShippingInfo::default(),
        fallback_used: true,
    }
}

pub fn build_prompt(transcription: &str) -> String {
    format!(
        r#"You are a professional product curator and listing specialist for creative handmade items. Based on the following creator's voice transcription and product images, create a compelling listing for an online creative marketplace in India.

Creator's Transcription: "{transcription}"

Analyze the product images and transcription and respond with JSON of this EXACT structure:
{{
  "title": "Compelling product title",
  "description": "Detailed product description (150-250 words) including materials, craftsmanship, features, and appeal",
  "tags": ["tag1", "tag2", "tag3", "tag4", "tag5", "tag6", "tag7"],
  "category": "Art/Crafts/Jewelry/Clothing/Home & Decor",
  "suggestedPrice": "₹XXX",
  "story": "Creator's story and inspiration behind the piece (100-150 words)",
  "features": ["feature1", "feature2", "feature3"],
  "specifications": {{"Dimension": "X cm x Y cm", "Weight": "Z kg", "Material": "Type of material", "Color": "Dominant color"}},
  "inStock": true,
  "stockCount": 10,
  "shippingInfo": {{"estimatedDays": "3-5 business days", "returnPolicy": "30-day returns"}}
}}

Guidelines:
- Title should be descriptive and appealing to Indian buyers
- Description should highlight materials, craftsmanship, quality, and unique features
- Tags should cover materials, style, colors, occasion, function and keywords, in proper case
- Category must be one of: Art, Crafts, Jewelry, Clothing, Home & Decor
- Price must be a single amount in Indian Rupees formatted as "₹XXX", never a range
- Story should be personal and use any background or inspiration the creator mentions
- Consider Indian cultural context and traditional craftsmanship
- Respond with valid JSON only"#
    )
}

/// Removes a surrounding Markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the model's reply text into a normalized listing.
pub fn parse_generated(text: &str) -> Result<GeneratedListing, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(GenerationError::Parse("expected a JSON object".into()));
    }
    Ok(normalize(&value))
}

/// Fills missing fields with defaults and coerces loosely typed values.
pub fn normalize(value: &Value) -> GeneratedListing {
    let field = |camel: &str, snake: &str| -> Option<&Value> {
        value
            .get(camel)
            .or_else(|| value.get(snake))
            .filter(|v| !v.is_null())
    };

    let text = |camel: &str, snake: &str, default: &str| -> String {
        match field(camel, snake) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    };

    let tags = match field("tags", "tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .take(MAX_TAGS)
            .collect(),
        _ => vec!["Handmade".to_string(), "Unique".to_string()],
    };

    let features = match field("features", "features") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        _ => Vec::new(),
    };

    let specifications = match field("specifications", "specifications") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    let in_stock = match field("inStock", "in_stock") {
        Some(Value::Bool(b)) => *b,
        _ => true,
    };

    let stock_count = match field("stockCount", "stock_count") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(DEFAULT_STOCK_COUNT),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_STOCK_COUNT),
        _ => DEFAULT_STOCK_COUNT,
    };

    let shipping_info = match field("shippingInfo", "shipping_info") {
        Some(Value::Object(map)) => {
            let get = |camel: &str, snake: &str| {
                map.get(camel)
                    .or_else(|| map.get(snake))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            let default = ShippingInfo::default();
            ShippingInfo {
                estimated_days: get("estimatedDays", "estimated_days")
                    .unwrap_or(default.estimated_days),
                return_policy: get("returnPolicy", "return_policy")
                    .unwrap_or(default.return_policy),
            }
        }
        Some(_) => ShippingInfo {
            estimated_days: "N/A".to_string(),
            return_policy: "N/A".to_string(),
        },
        None => ShippingInfo::default(),
    };

    GeneratedListing {
        title: text("title", "title", DEFAULT_TITLE),
        description: text(
            "description",
            "description",
            "Beautiful handcrafted item with attention to detail",
        ),
        tags,
        category: text("category", "category", DEFAULT_CATEGORY),
        suggested_price: text("suggestedPrice", "suggested_price", DEFAULT_SUGGESTED_PRICE),
        story: text(
            "story",
            "story",
            "This piece represents the creator's passion for handmade craftsmanship",
        ),
        features,
        specifications,
        in_stock,
        stock_count,
        shipping_info,
        fallback_used: false,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts a rupee price string such as `"₹1,299"` into paise. Unparseable input yields 0.
pub fn parse_price_minor(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let without_symbol = ["₹", "INR", "Rs.", "Rs"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    let cleaned: String = without_symbol
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(rupees) if rupees.is_finite() && rupees >= 0.0 => (rupees * 100.0).round() as i64,
        _ => 0,
    }
}
