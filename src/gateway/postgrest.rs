use super::Gateway;
use crate::errors::GatewayError;
use crate::models::{
    date_key, Completion, LeaderboardEntry, Stats, SubmitOutcome, UserHandle, UserRecord,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

const UNIQUE_VIOLATION: &str = "23505";
const NO_ROWS: &str = "PGRST116";

/// Gateway for a hosted PostgREST backend (the Supabase REST surface).
#[derive(Clone)]
pub struct PostgrestGateway {
    http: Client,
    rest_url: String,
    api_key: String,
}

impl PostgrestGateway {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(http: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        params: serde_json::Value,
    ) -> Result<T, GatewayError> {
        debug!(function, "postgrest rpc");
        let request = self
            .http
            .post(format!("{}/rpc/{function}", self.rest_url))
            .json(&params);
        decode(self.authorized(request).send().await?).await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        debug!(table, "postgrest select");
        let request = self
            .http
            .get(format!("{}/{table}", self.rest_url))
            .query(query);
        decode(self.authorized(request).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(classify_error(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Maps a failed PostgREST response onto the gateway error taxonomy.
///
/// A unique violation, a bare 409 or a message mentioning "duplicate" is a
/// duplicate; `PGRST116` (zero rows for a single-row read) is not-found.
pub fn classify_error(status: StatusCode, body: &str) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.as_deref().unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.trim().to_string());

    let bare_conflict = status == StatusCode::CONFLICT && code.is_empty();
    if code == UNIQUE_VIOLATION || bare_conflict || message.to_lowercase().contains("duplicate") {
        GatewayError::Duplicate
    } else if code == NO_ROWS {
        GatewayError::NotFound
    } else if message.is_empty() {
        GatewayError::Unavailable(status.to_string())
    } else {
        GatewayError::Unavailable(format!("{status}: {message}"))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl Gateway for PostgrestGateway {
    async fn create_or_get_user(
        &self,
        email: &str,
        name: &str,
    ) -> Result<UserHandle, GatewayError> {
        self.rpc(
            "get_or_create_user",
            json!({ "p_email": email, "p_name": name }),
        )
        .await
    }

    async fn find_completion(
        &self,
        user: &UserHandle,
        date: NaiveDate,
    ) -> Result<Option<Completion>, GatewayError> {
        let rows = self
            .select::<Completion>(
                "completions",
                &[
                    ("select", "id".to_string()),
                    ("user_id", eq(user)),
                    ("completion_date", eq(date_key(date))),
                    ("limit", "1".to_string()),
                ],
            )
            .await;

        match rows {
            Ok(rows) => Ok(rows.into_iter().next()),
            Err(GatewayError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn submit_completion(
        &self,
        email: &str,
        name: &str,
        date: NaiveDate,
    ) -> Result<SubmitOutcome, GatewayError> {
        let result = self
            .rpc::<Vec<Stats>>(
                "mark_completion",
                json!({
                    "p_email": email,
                    "p_name": name,
                    "p_completion_date": date_key(date),
                }),
            )
            .await;

        match result {
            Ok(rows) => Ok(SubmitOutcome::Recorded(rows.into_iter().next())),
            Err(GatewayError::Duplicate) => Ok(SubmitOutcome::Duplicate),
            Err(err) => Err(err),
        }
    }

    async fn compute_streak(&self, user: &UserHandle) -> Result<u32, GatewayError> {
        let streak: Option<u32> = self
            .rpc("calculate_streak", json!({ "p_user_id": user }))
            .await?;
        Ok(streak.unwrap_or(0))
    }

    async fn compute_total(&self, user: &UserHandle) -> Result<u32, GatewayError> {
        let total: Option<u32> = self
            .rpc("calculate_total_completions", json!({ "p_user_id": user }))
            .await?;
        Ok(total.unwrap_or(0))
    }

    async fn fetch_user_record(&self, user: &UserHandle) -> Result<UserRecord, GatewayError> {
        self.select::<UserRecord>(
            "users",
            &[
                ("select", "first_completion_date".to_string()),
                ("id", eq(user)),
                ("limit", "1".to_string()),
            ],
        )
        .await?
        .into_iter()
        .next()
        .ok_or(GatewayError::NotFound)
    }

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        self.select(
            "leaderboard_view",
            &[("select", "*".to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;

    #[test]
    fn classify_unique_violation_as_duplicate() {
        let body = r#"{"code":"23505","message":"conflicting key value violates unique constraint"}"#;
        assert_eq!(classify_error(StatusCode::CONFLICT, body), GatewayError::Duplicate);
    }

    #[test]
    fn classify_duplicate_message_as_duplicate() {
        let body = r#"{"code":"P0001","message":"Duplicate completion for today"}"#;
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, body),
            GatewayError::Duplicate
        );
    }

    #[test]
    fn classify_no_rows_as_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            classify_error(StatusCode::NOT_ACCEPTABLE, body),
            GatewayError::NotFound
        );
    }

    #[test]
    fn classify_other_failures_as_unavailable() {
        let err = classify_error(StatusCode::SERVICE_UNAVAILABLE, "upstream down");
        assert_eq!(
            err,
            GatewayError::Unavailable("503 Service Unavailable: upstream down".to_string())
        );

        let fk = r#"{"code":"23503","message":"violates foreign key constraint"}"#;
        assert!(matches!(
            classify_error(StatusCode::CONFLICT, fk),
            GatewayError::Unavailable(_)
        ));
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").is_some_and(|v| v == "anon-key")
            && headers
                .get("authorization")
                .is_some_and(|v| v == "Bearer anon-key")
    }

    async fn rpc(
        Path(function): Path<String>,
        headers: HeaderMap,
        Json(params): Json<serde_json::Value>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, Json(json!({ "message": "no key" })));
        }
        match function.as_str() {
            "get_or_create_user" => (AxumStatus::OK, Json(json!(7))),
            "calculate_streak" => (AxumStatus::OK, Json(json!(3))),
            "calculate_total_completions" => (AxumStatus::OK, Json(serde_json::Value::Null)),
            "mark_completion" if params["p_completion_date"] == "2026-01-05" => (
                AxumStatus::OK,
                Json(json!([{ "current_streak": 2, "total_completions": 9, "day_number": 12 }])),
            ),
            "mark_completion" => (
                AxumStatus::CONFLICT,
                Json(json!({ "code": "23505", "message": "duplicate key value" })),
            ),
            _ => (AxumStatus::NOT_FOUND, Json(json!({ "code": "PGRST202" }))),
        }
    }

    async fn completions(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        if query.get("completion_date").map(String::as_str) == Some("eq.2026-01-05") {
            Json(json!([{ "id": 55 }]))
        } else {
            Json(json!([]))
        }
    }

    async fn users() -> Json<serde_json::Value> {
        Json(json!([{ "first_completion_date": "2026-01-02" }]))
    }

    async fn leaderboard(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(0);
        let rows: Vec<_> = (0..10)
            .map(|i| {
                json!({
                    "name": format!("user{i}"),
                    "email": format!("u{i}@x.com"),
                    "total_completions": 10 - i,
                    "current_streak": 1
                })
            })
            .take(limit)
            .collect();
        Json(json!(rows))
    }

    async fn mock_backend() -> PostgrestGateway {
        let app = Router::new()
            .route("/rest/v1/rpc/:function", post(rpc))
            .route("/rest/v1/completions", get(completions))
            .route("/rest/v1/users", get(users))
            .route("/rest/v1/leaderboard_view", get(leaderboard));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        PostgrestGateway::new(&format!("http://{addr}/"), "anon-key")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[tokio::test]
    async fn reads_and_rpcs_decode() {
        let gateway = mock_backend().await;
        let user = gateway.create_or_get_user("a@x.com", "Ann").await.unwrap();
        assert_eq!(user.as_str(), "7");

        assert_eq!(gateway.compute_streak(&user).await.unwrap(), 3);
        assert_eq!(gateway.compute_total(&user).await.unwrap(), 0);
        assert_eq!(
            gateway.fetch_user_record(&user).await.unwrap().first_completion_date,
            Some(day(2))
        );
        assert!(gateway.find_completion(&user, day(5)).await.unwrap().is_some());
        assert!(gateway.find_completion(&user, day(6)).await.unwrap().is_none());

        let board = gateway.fetch_leaderboard(5).await.unwrap();
        assert_eq!(board.len(), 5);
        assert_eq!(board[0].total_completions, 10);
    }

    #[tokio::test]
    async fn submit_distinguishes_recorded_from_duplicate() {
        let gateway = mock_backend().await;
        let recorded = gateway
            .submit_completion("a@x.com", "Ann", day(5))
            .await
            .unwrap();
        assert_eq!(
            recorded,
            SubmitOutcome::Recorded(Some(Stats {
                current_streak: 2,
                total_completions: 9,
                day_number: 12,
            }))
        );

        let duplicate = gateway
            .submit_completion("a@x.com", "Ann", day(6))
            .await
            .unwrap();
        assert_eq!(duplicate, SubmitOutcome::Duplicate);
    }

    #[tokio::test]
    async fn missing_key_is_unavailable() {
        let gateway = mock_backend().await;
        let unauthorized = PostgrestGateway::with_client(
            Client::new(),
            gateway.rest_url.trim_end_matches("/rest/v1"),
            "wrong",
        );
        let err = unauthorized
            .create_or_get_user("a@x.com", "Ann")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
