//! Twilio WhatsApp client for Whatsy.
//!
//! This crate owns everything provider-shaped:
//!
//! - [`WebhookPayload`] - typed view of the form-encoded webhook, including
//!   the indexed media url/content-type pairs
//! - [`TwilioClient`] - authenticated media download (implements
//!   [`assistant_core::MediaFetcher`]) and outbound message send
//! - [`MessagingResponse`] - the TwiML reply envelope

mod client;
mod config;
mod error;
mod twiml;
mod webhook;

pub use client::{media_sid_from_url, TwilioClient};
pub use config::TwilioConfig;
pub use error::PayloadError;
pub use twiml::MessagingResponse;
pub use webhook::{MediaRef, WebhookPayload};
