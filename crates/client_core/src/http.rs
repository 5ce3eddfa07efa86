//! HTTP implementation of the tab-group store.
//!
//! Thin JSON-over-REST client; server failures are mapped onto the shared
//! error taxonomy so callers can classify without parsing text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{GroupId, ItemId, ShareLink, TabGroup},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{
        CreateFolderRequest, CreateShareRequest, ShareResponse, TabGroupListResponse,
        UpdateTabGroupItemRequest, UpdateTabGroupRequest,
    },
};

use crate::TabGroupStore;

pub struct HttpTabGroupStore {
    http: Client,
    base_url: String,
}

impl HttpTabGroupStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Lifts a non-success status into an [`ApiException`], preferring the
    /// structured error body when the server sent one.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiError>(&body) {
            Ok(api_error) => api_error.message,
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };
        Err(ApiException::new(ErrorCode::from_status(status.as_u16()), message).into())
    }
}

#[async_trait]
impl TabGroupStore for HttpTabGroupStore {
    async fn list_groups(&self) -> Result<Vec<TabGroup>> {
        let response = self
            .http
            .get(self.endpoint("tab-groups"))
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        let body: TabGroupListResponse = Self::check(response)
            .await?
            .json()
            .await
            .context("invalid tab-group list payload")?;
        Ok(body.groups)
    }

    async fn update_group(&self, id: GroupId, patch: UpdateTabGroupRequest) -> Result<()> {
        let response = self
            .http
            .patch(self.endpoint(&format!("tab-groups/{id}")))
            .json(&patch)
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_group(&self, id: GroupId) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(&format!("tab-groups/{id}")))
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_item(&self, id: ItemId, patch: UpdateTabGroupItemRequest) -> Result<()> {
        let response = self
            .http
            .patch(self.endpoint(&format!("tab-group-items/{id}")))
            .json(&patch)
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(&format!("tab-group-items/{id}")))
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_share(&self, id: GroupId, request: CreateShareRequest) -> Result<ShareLink> {
        let response = self
            .http
            .post(self.endpoint(&format!("tab-groups/{id}/shares")))
            .json(&request)
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        let body: ShareResponse = Self::check(response)
            .await?
            .json()
            .await
            .context("invalid share payload")?;
        Ok(ShareLink {
            share_id: body.share_id,
            share_url: body.share_url,
            expires_in_days: body.expires_in_days,
        })
    }

    async fn create_folder(&self, title: &str, parent_id: Option<GroupId>) -> Result<TabGroup> {
        let response = self
            .http
            .post(self.endpoint("folders"))
            .json(&CreateFolderRequest {
                title: title.to_string(),
                parent_id,
            })
            .send()
            .await
            .context("failed to reach the tab-group service")?;
        let folder: TabGroup = Self::check(response)
            .await?
            .json()
            .await
            .context("invalid folder payload")?;
        Ok(folder)
    }
}
