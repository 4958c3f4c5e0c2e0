use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    db_types::{BuyerSummary, Order, OrderId, ProductSummary},
    store_api::{
        errors::{OrderFlowError, OrderLookup},
        order_objects::{OrderDetails, OrderQueryFilter},
    },
    traits::{AuthManagement, CatalogManagement, OrderManagement},
};

/// Read-only order listings, joined with product and buyer summaries.
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: OrderManagement + CatalogManagement + AuthManagement
{
    pub async fn list_orders(&self, filter: OrderQueryFilter) -> Result<Vec<OrderDetails>, OrderFlowError> {
        trace!("📋️ Listing orders: {filter}");
        let orders = self.db.search_orders(filter).await?;
        self.join_summaries(orders).await
    }

    pub async fn order_details(&self, order_id: OrderId) -> Result<OrderDetails, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(OrderLookup::Id(order_id)))?;
        let mut details = self.join_summaries(vec![order]).await?;
        details.pop().ok_or(OrderFlowError::OrderNotFound(OrderLookup::Id(order_id)))
    }

    pub async fn orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<OrderDetails>, OrderFlowError> {
        self.list_orders(OrderQueryFilter::default().with_buyer_id(buyer_id)).await
    }

    async fn join_summaries(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>, OrderFlowError> {
        let mut products: HashMap<i64, Option<ProductSummary>> = HashMap::new();
        let mut buyers: HashMap<i64, Option<BuyerSummary>> = HashMap::new();
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            if !products.contains_key(&order.product_id) {
                let product = self.db.fetch_product(order.product_id).await?.map(ProductSummary::from);
                products.insert(order.product_id, product);
            }
            if !buyers.contains_key(&order.buyer_id) {
                let buyer = self.db.fetch_user(order.buyer_id).await?.map(BuyerSummary::from);
                buyers.insert(order.buyer_id, buyer);
            }
            let product = products.get(&order.product_id).cloned().flatten();
            let buyer = buyers.get(&order.buyer_id).cloned().flatten();
            if product.is_none() || buyer.is_none() {
                debug!("📋️ Order {} refers to a product or buyer that no longer exists", order.id);
            }
            result.push(OrderDetails { order, product, buyer });
        }
        Ok(result)
    }
}
