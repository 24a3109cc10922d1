use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry as returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub sku: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Client-supplied fields for creating or replacing a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub sku: String,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64, sku: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
            sku: sku.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_camel_case() {
        let now = Utc::now();
        let p = Product {
            id: 1,
            name: "Latte".into(),
            description: "Frothy milky coffee".into(),
            price: 2.45,
            sku: "abc323".into(),
            created_on: now,
            updated_on: now,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("createdOn").is_some());
        assert!(json.get("updatedOn").is_some());
        assert_eq!(json["price"], 2.45);
    }

    #[test]
    fn description_is_optional() {
        let p: NewProduct =
            serde_json::from_str(r#"{"name":"Tea","price":3.14,"sku":"prod-bev-003"}"#).unwrap();
        assert_eq!(p.description, "");
    }
}
