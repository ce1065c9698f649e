//! Paginated instance discovery.

use std::collections::HashSet;

use super::types::{Instance, InstancePage};
use super::{ContaboApi, FetchError};
use crate::transport::{Method, Transport};

/// Result of walking the inventory pages.
///
/// Traversal stops at the first failing page. Instances gathered before the
/// failure are kept and the error is attached in `interrupted`, so a run
/// still covers every instance it could discover.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Inventory {
    /// Instances in listing order.
    pub instances: Vec<Instance>,
    /// Error that cut the traversal short, if any.
    pub interrupted: Option<FetchError>,
}

impl<T: Transport> ContaboApi<T> {
    /// Lists every instance by following `_links.next` until it is absent.
    pub async fn list_all(&self) -> Inventory {
        let mut inventory = Inventory::default();
        let mut visited = HashSet::new();
        let mut next = Some(format!(
            "{}?page=1&size={}",
            self.settings.instances_url(),
            self.settings.page_size
        ));

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(%url, "inventory pagination revisited a page; stopping");
                break;
            }

            let page = match self.fetch_page(&url).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        %url,
                        error = %err,
                        collected = inventory.instances.len(),
                        "inventory page failed; continuing with partial inventory"
                    );
                    inventory.interrupted = Some(err);
                    break;
                }
            };

            next = page.next_link().map(|link| self.settings.resolve(link));
            for record in page.data {
                match record.into_instance() {
                    Some(instance) => inventory.instances.push(instance),
                    None => tracing::warn!(%url, "skipping inventory record without instanceId"),
                }
            }
        }

        tracing::info!(
            instances = inventory.instances.len(),
            complete = inventory.interrupted.is_none(),
            "inventory listing finished"
        );
        inventory
    }

    async fn fetch_page(&self, url: &str) -> Result<InstancePage, FetchError> {
        let response = self
            .send_authorised(Self::request(Method::Get, url))
            .await?;

        if response.status != 200 {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|err| FetchError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
    }
}
