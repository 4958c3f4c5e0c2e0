mod setups;
mod steps;

pub use storefront_world::StorefrontWorld;
