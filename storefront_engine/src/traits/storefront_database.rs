use crate::traits::{AuthManagement, CatalogManagement, OrderManagement, OrderStoreError};

/// The highest level of behaviour for storefront backends: everything the order flow, checkout, reconciliation and
/// admin APIs need, from a single cloneable handle.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + OrderManagement + CatalogManagement + AuthManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    async fn close(&mut self) -> Result<(), OrderStoreError>;
}
