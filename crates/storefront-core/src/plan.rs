//! Plan Catalog
//!
//! The fixed set of subscription plans offered on the storefront.

use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// An immutable catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Stable identifier (e.g. "plan-1-mes")
    pub id: String,

    /// Display name
    pub name: String,

    /// Duration label shown next to the price
    pub duration: String,

    /// Price in currency units (BRL)
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Pre-formatted price (e.g. "R$ 19,90")
    pub price_display: String,

    /// Optional discount badge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

static CATALOG: LazyLock<Vec<Plan>> = LazyLock::new(|| {
    vec![
        Plan::new("plan-1-mes", "1 Mês", dec!(19.90), "R$ 19,90", None),
        Plan::new("plan-3-meses", "3 Meses", dec!(27.90), "R$ 27,90", Some("25% off")),
        Plan::new("plan-vitalicio", "Vitalício", dec!(47.90), "R$ 47,90", Some("50% off")),
    ]
});

impl Plan {
    fn new(
        id: &str,
        name: &str,
        price: Decimal,
        price_display: &str,
        discount: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration: name.into(),
            price,
            price_display: price_display.into(),
            discount: discount.map(Into::into),
        }
    }

    /// All plans, in display order
    pub fn catalog() -> &'static [Self] {
        &CATALOG
    }

    /// Look up a plan by identifier
    pub fn find(id: &str) -> Option<&'static Self> {
        CATALOG.iter().find(|p| p.id == id)
    }
}
