use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_common::parse_list;
use storefront_engine::{db_types::OrderStatusType, order_objects::OrderQueryFilter};

use crate::errors::ServerError;

/// Query parameters for `GET /api/orders`. `status` takes a comma separated list, e.g. `?status=pending,approved`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub buyer_id: Option<i64>,
    pub product_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<OrderListParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderListParams) -> Result<Self, Self::Error> {
        let mut filter = OrderQueryFilter::default();
        for s in params.status.as_deref().map(parse_list).unwrap_or_default() {
            let status = OrderStatusType::from_str(&s).map_err(|e| ServerError::InvalidQuery(e.to_string()))?;
            filter = filter.with_status(status);
        }
        if let Some(id) = params.buyer_id {
            filter = filter.with_buyer_id(id);
        }
        if let Some(id) = params.product_id {
            filter = filter.with_product_id(id);
        }
        if let Some(since) = params.since {
            filter = filter.with_since(since);
        }
        if let Some(until) = params.until {
            filter = filter.with_until(until);
        }
        Ok(filter)
    }
}
