//! Minimal Firebase Realtime Database client.
//!
//! Authenticates with a service-account key file through the OAuth2 JWT
//! bearer grant and writes JSON values over the database REST API.

pub mod auth;
pub mod credentials;
pub mod database;

pub use auth::TokenProvider;
pub use credentials::ServiceAccount;
pub use database::{DatabaseReference, FirebaseDatabase};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    //! In-process stand-in for the token endpoint and the database REST API.

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Form, OriginalUri, RawQuery, State};
    use axum::http::{header, HeaderMap};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::ServiceAccount;

    pub use axum::http::StatusCode;

    /// Throwaway key generated for tests only.
    pub const FIXTURE: &str = include_str!("../../testdata/service-account.json");

    #[derive(Debug, Clone)]
    pub struct RecordedWrite {
        pub path: String,
        pub query: Option<String>,
        pub authorization: Option<String>,
        pub body: String,
    }

    struct FakeState {
        expires_in: i64,
        reject_auth: bool,
        write_status: StatusCode,
        token_requests: Mutex<Vec<HashMap<String, String>>>,
        writes: Mutex<Vec<RecordedWrite>>,
    }

    pub struct FakeFirebase {
        pub base_url: String,
        state: Arc<FakeState>,
    }

    impl FakeFirebase {
        /// Tokens expire after `expires_in` seconds; writes answer with `write_status`.
        pub async fn start(expires_in: i64, write_status: StatusCode) -> Self {
            Self::spawn(FakeState {
                expires_in,
                reject_auth: false,
                write_status,
                token_requests: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
            })
            .await
        }

        pub async fn start_rejecting_auth() -> Self {
            Self::spawn(FakeState {
                expires_in: 3600,
                reject_auth: true,
                write_status: StatusCode::OK,
                token_requests: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
            })
            .await
        }

        async fn spawn(state: FakeState) -> Self {
            let state = Arc::new(state);
            let app = Router::new()
                .route("/token", post(token))
                .fallback(write)
                .with_state(Arc::clone(&state));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                base_url: format!("http://{addr}"),
                state,
            }
        }

        pub fn fixture_account() -> ServiceAccount {
            ServiceAccount::from_json(FIXTURE).unwrap()
        }

        pub fn token_uri(&self) -> String {
            format!("{}/token", self.base_url)
        }

        /// The fixture account, pointed at this server's token endpoint.
        pub fn service_account(&self) -> ServiceAccount {
            let mut account = Self::fixture_account();
            account.token_uri = self.token_uri();
            account
        }

        pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
            self.state.token_requests.lock().unwrap().clone()
        }

        pub fn writes(&self) -> Vec<RecordedWrite> {
            self.state.writes.lock().unwrap().clone()
        }
    }

    async fn token(
        State(state): State<Arc<FakeState>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Response {
        let issued = {
            let mut requests = state.token_requests.lock().unwrap();
            requests.push(form);
            requests.len()
        };

        if state.reject_auth {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid_grant"})),
            )
                .into_response();
        }

        Json(serde_json::json!({
            "access_token": format!("token-{issued}"),
            "expires_in": state.expires_in,
            "token_type": "Bearer",
        }))
        .into_response()
    }

    async fn write(
        State(state): State<Arc<FakeState>>,
        OriginalUri(uri): OriginalUri,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
        body: String,
    ) -> Response {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        state.writes.lock().unwrap().push(RecordedWrite {
            path: uri.path().to_string(),
            query,
            authorization,
            body,
        });

        if state.write_status.is_success() {
            state.write_status.into_response()
        } else {
            (
                state.write_status,
                Json(serde_json::json!({"error": "Permission denied"})),
            )
                .into_response()
        }
    }
}
