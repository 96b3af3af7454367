//! reqwest client for the diary HTTP API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;

use super::{ApiError, DiaryApi};
use crate::models::{ChosenOptions, DiaryEntry, EntryPatch, ListName, NewFoodEntry};

#[derive(Serialize)]
struct AddFoodBody<'a> {
    food_id: &'a str,
    #[serde(rename = "chosenOptions")]
    chosen_options: &'a ChosenOptions,
}

#[derive(Serialize)]
struct RemoveFoodsBody<'a> {
    #[serde(rename = "selectedIds")]
    selected_ids: &'a [String],
}

/// HTTP implementation of [`DiaryApi`], authenticating with a bearer key.
#[derive(Debug, Clone)]
pub struct HttpDiaryApi {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpDiaryApi {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Builds the URL of the entry resource for `date`, plus an optional suffix.
    fn entry_url(&self, date: NaiveDate, suffix: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };
        format!("{}/diary/{}{}", base, date.format("%Y-%m-%d"), suffix)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    async fn read_entry(response: Response) -> Result<DiaryEntry, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DiaryApi for HttpDiaryApi {
    async fn get_entry(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, ApiError> {
        let url = self.entry_url(date, "");
        tracing::debug!("GET {}", url);

        let response = Self::send(self.request(Method::GET, &url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_entry(response).await.map(Some)
    }

    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: &NewFoodEntry,
    ) -> Result<DiaryEntry, ApiError> {
        let url = self.entry_url(
            date,
            &format!("/add-food?list={}", urlencoding::encode(list.as_str())),
        );
        tracing::debug!("POST {}", url);

        let body = AddFoodBody {
            food_id: &food.food.id,
            chosen_options: &food.chosen_options,
        };
        let response = Self::send(self.request(Method::POST, &url).json(&body)).await?;
        Self::read_entry(response).await
    }

    async fn update_entry(
        &self,
        date: NaiveDate,
        patch: &EntryPatch,
    ) -> Result<DiaryEntry, ApiError> {
        let url = self.entry_url(date, "");
        tracing::debug!("PATCH {}", url);

        let response = Self::send(self.request(Method::PATCH, &url).json(patch)).await?;
        Self::read_entry(response).await
    }

    async fn remove_foods(&self, date: NaiveDate, ids: &[String]) -> Result<DiaryEntry, ApiError> {
        let url = self.entry_url(date, "/foods");
        tracing::debug!("DELETE {} ({} ids)", url, ids.len());

        let body = RemoveFoodsBody { selected_ids: ids };
        let response = Self::send(self.request(Method::DELETE, &url).json(&body)).await?;
        Self::read_entry(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Food, FoodEntry};
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Entries = Arc<Mutex<HashMap<String, DiaryEntry>>>;

    #[derive(Deserialize)]
    struct ListQuery {
        list: ListName,
    }

    #[derive(Deserialize)]
    struct AddFoodRequest {
        food_id: String,
        #[serde(rename = "chosenOptions")]
        chosen_options: ChosenOptions,
    }

    #[derive(Deserialize)]
    struct RemoveRequest {
        #[serde(rename = "selectedIds")]
        selected_ids: Vec<String>,
    }

    fn authorized(headers: &HeaderMap) -> Result<(), AxumStatus> {
        match headers.get("authorization").and_then(|h| h.to_str().ok()) {
            Some("Bearer test-key") => Ok(()),
            _ => Err(AxumStatus::UNAUTHORIZED),
        }
    }

    async fn get_entry(
        State(entries): State<Entries>,
        headers: HeaderMap,
        Path(date): Path<String>,
    ) -> Result<Json<DiaryEntry>, AxumStatus> {
        authorized(&headers)?;
        let entries = entries.lock().unwrap();
        entries
            .get(&date)
            .cloned()
            .map(Json)
            .ok_or(AxumStatus::NOT_FOUND)
    }

    async fn patch_entry(
        State(entries): State<Entries>,
        headers: HeaderMap,
        Path(date): Path<String>,
        Json(patch): Json<EntryPatch>,
    ) -> Result<Json<DiaryEntry>, AxumStatus> {
        authorized(&headers)?;
        let mut entries = entries.lock().unwrap();
        let entry = entries.entry(date).or_default();
        entry.apply(&patch);
        Ok(Json(entry.clone()))
    }

    async fn add_food(
        State(entries): State<Entries>,
        headers: HeaderMap,
        Path(date): Path<String>,
        Query(query): Query<ListQuery>,
        Json(body): Json<AddFoodRequest>,
    ) -> Result<Json<DiaryEntry>, AxumStatus> {
        authorized(&headers)?;
        let mut entries = entries.lock().unwrap();
        let entry = entries.entry(date).or_default();
        let id = format!("srv-{}", entry.eaten.len() + entry.to_eat.len() + 1);
        entry.list_mut(query.list).push(FoodEntry {
            id,
            chosen_food: Food::new(body.food_id, "From catalogue"),
            chosen_options: body.chosen_options,
        });
        Ok(Json(entry.clone()))
    }

    async fn remove_foods(
        State(entries): State<Entries>,
        headers: HeaderMap,
        Path(date): Path<String>,
        Json(body): Json<RemoveRequest>,
    ) -> Result<Json<DiaryEntry>, AxumStatus> {
        authorized(&headers)?;
        let mut entries = entries.lock().unwrap();
        let entry = entries.entry(date).or_default();
        let patch = entry.without_foods(&body.selected_ids);
        entry.apply(&patch);
        Ok(Json(entry.clone()))
    }

    async fn serve(entries: Entries) -> String {
        let app = Router::new()
            .route("/diary/{date}", get(get_entry).patch(patch_entry))
            .route("/diary/{date}/add-food", post(add_food))
            .route("/diary/{date}/foods", axum::routing::delete(remove_foods))
            .with_state(entries);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn new_food() -> NewFoodEntry {
        let food = Food::new("food-1", "Apple").with_nutrients(220.0, 0.3, 0.2, 12.0);
        let options = ChosenOptions::compute(&food, 150.0, 1.0);
        NewFoodEntry::new(food, options)
    }

    #[test]
    fn test_entry_url_with_http() {
        let api = HttpDiaryApi::new("http://localhost:3000/api", "k");
        assert_eq!(
            api.entry_url(date(), ""),
            "http://localhost:3000/api/diary/2024-03-01"
        );
    }

    #[test]
    fn test_entry_url_trailing_slash_and_suffix() {
        let api = HttpDiaryApi::new("https://diary.example.com/api/", "k");
        assert_eq!(
            api.entry_url(date(), "/foods"),
            "https://diary.example.com/api/diary/2024-03-01/foods"
        );
    }

    #[test]
    fn test_entry_url_bare_host() {
        let api = HttpDiaryApi::new("localhost:3000", "k");
        assert_eq!(
            api.entry_url(date(), ""),
            "http://localhost:3000/diary/2024-03-01"
        );
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let url = serve(Entries::default()).await;
        let api = HttpDiaryApi::new(url, "test-key");

        assert_eq!(api.get_entry(date()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let url = serve(Entries::default()).await;
        let api = HttpDiaryApi::new(url, "test-key");

        let updated = api
            .update_entry(date(), &EntryPatch::note("felt great"))
            .await
            .unwrap();
        assert_eq!(updated.note, "felt great");

        let fetched = api.get_entry(date()).await.unwrap().unwrap();
        assert_eq!(fetched.note, "felt great");
    }

    #[tokio::test]
    async fn test_add_food_and_remove_it() {
        let url = serve(Entries::default()).await;
        let api = HttpDiaryApi::new(url, "test-key");

        let entry = api
            .add_food(date(), ListName::ToEat, &new_food())
            .await
            .unwrap();
        assert_eq!(entry.to_eat.len(), 1);
        assert_eq!(entry.to_eat[0].chosen_food.id, "food-1");
        assert_eq!(entry.to_eat[0].chosen_options.serving_size, 150.0);

        let id = entry.to_eat[0].id.clone();
        let entry = api.remove_foods(date(), &[id]).await.unwrap();
        assert!(entry.to_eat.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_key_is_status_error() {
        let url = serve(Entries::default()).await;
        let api = HttpDiaryApi::new(url, "wrong-key");

        let result = api.update_entry(date(), &EntryPatch::note("x")).await;
        assert_eq!(result, Err(ApiError::Status(401)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpDiaryApi::new(format!("http://{}", addr), "test-key");
        let result = api.get_entry(date()).await;
        assert!(matches!(result, Err(ApiError::Request(_))));
    }
}
