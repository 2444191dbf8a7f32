use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::{ApiError, ApiJson, AppState};
use crate::checkout::{PricedItem, RawOrderForm};
use crate::domain::aggregates::Provenance;
use crate::domain::value_objects::{OrderId, OrderNumber};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub ok: bool,
    pub id: OrderId,
    pub order_number: OrderNumber,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub items: Vec<PricedItem>,
}

pub async fn create_order(
    State(s): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<OrderCreated>), ApiError> {
    let placed = s.checkout.place_order(&RawOrderForm::from_json(&body), provenance(&headers)).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            ok: true,
            id: placed.order.id,
            order_number: placed.order.order_number,
            total_amount: placed.order.total_amount,
            items: placed.items,
        }),
    ))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
}

/// Client IP, user agent and country from proxy headers.
pub fn provenance(headers: &HeaderMap) -> Provenance {
    let mut p = Provenance::default();
    let forwarded = header(headers, "x-forwarded-for").and_then(|v| v.split(',').next()).map(str::trim).filter(|v| !v.is_empty());
    if let Some(ip) = forwarded.or_else(|| header(headers, "x-real-ip")) {
        p.ip_address = ip.to_string();
    }
    if let Some(ua) = header(headers, "user-agent") {
        p.user_agent = ua.to_string();
    }
    if let Some(country) = ["x-country", "cf-ipcountry", "x-vercel-ip-country"].iter().find_map(|h| header(headers, h)) {
        p.source_country = country.to_string();
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_provenance_from_headers() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        h.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        h.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        h.insert("cf-ipcountry", HeaderValue::from_static("MA"));
        let p = provenance(&h);
        assert_eq!(p.ip_address, "203.0.113.7");
        assert_eq!(p.user_agent, "curl/8.0");
        assert_eq!(p.source_country, "MA");
    }

    #[test]
    fn test_provenance_fallbacks() {
        assert_eq!(provenance(&HeaderMap::new()), Provenance::default());

        let mut h = HeaderMap::new();
        h.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        h.insert("x-vercel-ip-country", HeaderValue::from_static("FR"));
        let p = provenance(&h);
        assert_eq!(p.ip_address, "10.0.0.2");
        assert_eq!(p.user_agent, "unknown");
        assert_eq!(p.source_country, "FR");
    }
}
