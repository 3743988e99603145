//! Webhook hub subscriptions for the Helix API.
//!
//! Twitch delivers change notifications (new followers, stream up/down, ...)
//! to a callback URL after a subscription request to the `webhooks/hub`
//! endpoint. This module builds those requests; the Helix client sends them
//! with [`HelixClient::subscribe`](crate::clients::HelixClient::subscribe) and
//! [`HelixClient::unsubscribe`](crate::clients::HelixClient::unsubscribe).
//!
//! # Overview
//!
//! - [`WebhookSubscription`]: callback, topic, optional lease and secret
//! - [`WebhookTopic`]: the watched resource, as a URL or an endpoint with parameters
//! - [`HubMode`]: subscribe or unsubscribe
//!
//! # Example
//!
//! ```rust,ignore
//! use twitch_api::webhooks::{WebhookSubscription, WebhookTopic};
//!
//! let subscription = WebhookSubscription::new(
//!     "https://example.com/hooks/streams",
//!     WebhookTopic::endpoint("streams").param("userId", "5678"),
//! )
//! .lease_seconds(864_000)
//! .secret("s3cr3t");
//!
//! client.helix().subscribe(&subscription, RequestOptions::default().credentials(app_token)).await?;
//! ```

mod types;

pub use types::{HubMode, WebhookSubscription, WebhookTopic};
