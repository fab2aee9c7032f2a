//! FCM HTTP v1 adapter.
//!
//! HTTP v1 has no multicast endpoint, so a multicast is fanned out as one
//! `messages:send` request per token, at most [`MAX_IN_FLIGHT_SENDS`] at a
//! time.

use std::collections::BTreeMap;
use std::sync::Arc;

use chat_functions_core::notification::{MulticastMessage, MulticastReport};
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::Serialize;

use crate::adapters::auth::AccessTokenProvider;
use crate::adapters::push::{PushError, PushSender};

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";
pub const MAX_IN_FLIGHT_SENDS: usize = 100;

#[derive(Debug, Clone)]
pub struct FcmClient {
    http: Client,
    send_url: String,
    tokens: Arc<AccessTokenProvider>,
    max_in_flight: usize,
}

/// Result of one per-token send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    Rejected(u16),
    Unreachable,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DeliveryTally {
    delivered: usize,
    rejected: usize,
    unreachable: usize,
    /// Most frequent rejection status, for the failure summary.
    top_rejection: Option<u16>,
}

impl DeliveryTally {
    fn from_deliveries(deliveries: &[Delivery]) -> Self {
        let mut tally = Self::default();
        let mut rejections: BTreeMap<u16, usize> = BTreeMap::new();
        for delivery in deliveries {
            match delivery {
                Delivery::Delivered => tally.delivered += 1,
                Delivery::Rejected(status) => {
                    tally.rejected += 1;
                    *rejections.entry(*status).or_default() += 1;
                }
                Delivery::Unreachable => tally.unreachable += 1,
            }
        }
        tally.top_rejection = rejections
            .into_iter()
            .max_by_key(|(status, count)| (*count, std::cmp::Reverse(*status)))
            .map(|(status, _)| status);
        tally
    }

    fn failures(&self) -> usize {
        self.rejected + self.unreachable
    }

    fn report(&self) -> MulticastReport {
        MulticastReport {
            success_count: self.delivered,
            failure_count: self.failures(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: NotificationBlock<'a>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct NotificationBlock<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AndroidConfig<'a> {
    notification: AndroidNotification<'a>,
}

#[derive(Debug, Serialize)]
struct AndroidNotification<'a> {
    click_action: &'a str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig<'a> {
    payload: ApnsPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ApnsPayload<'a> {
    aps: Aps<'a>,
}

#[derive(Debug, Serialize)]
struct Aps<'a> {
    category: &'a str,
}

impl FcmClient {
    pub fn new(
        http: Client,
        base_url: &str,
        project_id: &str,
        tokens: Arc<AccessTokenProvider>,
    ) -> Self {
        Self {
            http,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                base_url.trim_end_matches('/'),
                project_id
            ),
            tokens,
            max_in_flight: MAX_IN_FLIGHT_SENDS,
        }
    }

    /// Caps concurrent `messages:send` requests; zero is treated as one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub async fn multicast(&self, message: &MulticastMessage) -> Result<MulticastReport, PushError> {
        if message.tokens.is_empty() {
            return Ok(MulticastReport::default());
        }

        let access_token = self.tokens.access_token(&self.http).await?;
        let deliveries: Vec<Delivery> = stream::iter(&message.tokens)
            .map(|token| self.send_one(&access_token, token, message))
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let tally = DeliveryTally::from_deliveries(&deliveries);
        if tally.failures() > 0 {
            tracing::warn!(
                recipients = deliveries.len(),
                failure_count = tally.failures(),
                rejected = tally.rejected,
                unreachable = tally.unreachable,
                top_rejection_status = tally.top_rejection,
                "some push deliveries failed"
            );
        }
        Ok(tally.report())
    }

    async fn send_one(
        &self,
        access_token: &str,
        token: &str,
        message: &MulticastMessage,
    ) -> Delivery {
        let notification = &message.notification;
        let request = SendRequest {
            message: Message {
                token,
                notification: NotificationBlock {
                    title: &notification.title,
                    body: &notification.body,
                },
                android: AndroidConfig {
                    notification: AndroidNotification {
                        click_action: &notification.click_action,
                    },
                },
                apns: ApnsConfig {
                    payload: ApnsPayload {
                        aps: Aps {
                            category: &notification.click_action,
                        },
                    },
                },
                data: &message.data,
            },
        };

        match self
            .http
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Delivery::Delivered,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "push delivery rejected");
                Delivery::Rejected(response.status().as_u16())
            }
            Err(error) => {
                tracing::debug!(error = %error, "push delivery failed");
                Delivery::Unreachable
            }
        }
    }
}

impl PushSender for FcmClient {
    fn send_multicast(&self, message: &MulticastMessage) -> Result<MulticastReport, PushError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.multicast(message))
        })
    }
}
