//! hc-payments: Stripe checkout integration for hc-gateway
//!
//! Resolves a service's price from the catalog, opens a hosted checkout
//! session and records the payment attempt for later reconciliation.

pub mod error;
pub mod issuer;
pub mod stripe;

pub use error::{PaymentError, Result};
pub use issuer::PaymentLinkIssuer;
pub use stripe::{CheckoutSession, StripeClient};
