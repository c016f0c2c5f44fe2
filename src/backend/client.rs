use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::backend::api_types::{ApiPage, ApiStatusChange};
use crate::config::Config;
use crate::listing::{FilterSet, Listable, Mutation, RemotePage, Repository};

/// Shop API client wrapper
#[derive(Clone)]
pub struct ShopClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl ShopClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.backend.url)
      .map_err(|e| eyre!("Invalid backend url {}: {}", config.backend.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.backend.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token: Config::get_api_token(),
    })
  }

  /// `{base}/{segments...}`
  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| eyre!("Backend url cannot be a base: {}", self.base))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn page_url(
    &self,
    resource: &str,
    page: usize,
    page_size: usize,
    pairs: &[(String, String)],
  ) -> Result<Url> {
    let mut url = self.endpoint(&[resource])?;
    {
      let mut query = url.query_pairs_mut();
      query
        .append_pair("page", &page.to_string())
        .append_pair("size", &page_size.to_string());
      for (key, value) in pairs {
        query.append_pair(key, value);
      }
    }
    Ok(url)
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
    let response = self
      .authorize(request)
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", what, e))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(eyre!("Failed to {}: HTTP {} {}", what, status, body.trim()));
    }
    Ok(response)
  }

  async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", what, e))
  }

  /// `GET /{resource}?page=&size=&...`
  pub async fn get_page<T: DeserializeOwned>(
    &self,
    resource: &str,
    page: usize,
    page_size: usize,
    pairs: &[(String, String)],
  ) -> Result<ApiPage<T>> {
    let url = self.page_url(resource, page, page_size, pairs)?;
    debug!(url = %url, "GET page");

    let what = format!("list {}", resource);
    let response = self.send(self.http.get(url), &what).await?;
    Self::decode(response, &what).await
  }

  pub async fn create<T: Serialize + DeserializeOwned>(&self, resource: &str, body: &T) -> Result<T> {
    let url = self.endpoint(&[resource])?;
    let what = format!("create {}", resource);
    let response = self.send(self.http.post(url).json(body), &what).await?;
    Self::decode(response, &what).await
  }

  pub async fn update<T: Serialize + DeserializeOwned>(
    &self,
    resource: &str,
    id: u64,
    body: &T,
  ) -> Result<T> {
    let url = self.endpoint(&[resource, &id.to_string()])?;
    let what = format!("update {} {}", resource, id);
    let response = self.send(self.http.put(url).json(body), &what).await?;
    Self::decode(response, &what).await
  }

  pub async fn delete(&self, resource: &str, id: u64) -> Result<()> {
    let url = self.endpoint(&[resource, &id.to_string()])?;
    self
      .send(self.http.delete(url), &format!("delete {} {}", resource, id))
      .await?;
    Ok(())
  }

  /// `PATCH /{resource}/{id}/estado`
  pub async fn change_status(&self, resource: &str, id: u64, status: &str) -> Result<()> {
    let url = self.endpoint(&[resource, &id.to_string(), "estado"])?;
    let body = ApiStatusChange { estado: status };
    self
      .send(
        self.http.patch(url).json(&body),
        &format!("change status of {} {}", resource, id),
      )
      .await?;
    Ok(())
  }
}

/// A `Repository` for one REST resource.
pub struct HttpRepository<E> {
  client: ShopClient,
  resource: &'static str,
  _entity: PhantomData<fn() -> E>,
}

impl<E> HttpRepository<E> {
  pub fn new(client: ShopClient, resource: &'static str) -> Self {
    Self {
      client,
      resource,
      _entity: PhantomData,
    }
  }
}

#[async_trait]
impl<E> Repository<E> for HttpRepository<E>
where
  E: Listable + Serialize + DeserializeOwned,
{
  async fn list_paged(
    &self,
    page: usize,
    page_size: usize,
    filters: &FilterSet<E::Field>,
  ) -> Result<RemotePage<E>> {
    let page: ApiPage<E> = self
      .client
      .get_page(self.resource, page, page_size, &filters.query_pairs())
      .await?;
    Ok(page.into_remote())
  }

  async fn mutate(&self, mutation: Mutation<E>) -> Result<Option<E>> {
    match mutation {
      Mutation::Create(entity) => self.client.create(self.resource, &entity).await.map(Some),
      Mutation::Update(entity) => self
        .client
        .update(self.resource, entity.id(), &entity)
        .await
        .map(Some),
      Mutation::Delete(id) => {
        self.client.delete(self.resource, id).await?;
        Ok(None)
      }
      Mutation::ChangeStatus { id, status } => {
        self.client.change_status(self.resource, id, &status).await?;
        Ok(None)
      }
    }
  }
}
