use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::Claims;
use auth::JwtHandler;
use auth::PasswordHasher;
use serde_json::json;
use user_service::domain::user::models::CreateUserCommand;
use user_service::domain::user::models::DisplayName;
use user_service::domain::user::models::EmailAddress;
use user_service::domain::user::models::Role;
use user_service::domain::user::models::User;
use user_service::domain::user::ports::UserServicePort;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::inbound::http::router::AppState;
use user_service::outbound::repositories::InMemoryUserRepository;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass-1";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
    pub admin: User,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        // Cheapest argon2 cost keeps the suite fast
        let authenticator = Arc::new(
            Authenticator::new(JWT_SECRET)
                .with_password_hasher(PasswordHasher::with_cost(1).unwrap()),
        );
        let user_repo = Arc::new(InMemoryUserRepository::new());
        let user_service: Arc<dyn UserServicePort> =
            Arc::new(UserService::new(user_repo, Arc::clone(&authenticator)));

        let admin = user_service
            .create_user(CreateUserCommand::new(
                EmailAddress::new(ADMIN_EMAIL.to_string()).unwrap(),
                ADMIN_PASSWORD.to_string(),
                DisplayName::new("Admin".to_string()).unwrap(),
                Role::Admin,
            ))
            .await
            .expect("Failed to seed admin");

        let router = create_router(
            AppState {
                user_service,
                authenticator,
            },
            Duration::from_secs(30),
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(JWT_SECRET),
            admin,
        }
    }

    /// Mint a token directly, bypassing login
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::for_user(
            user.id,
            user.email.as_str(),
            user.role.as_str(),
            chrono::Duration::hours(1),
        )
        .expect("Failed to build claims");
        self.jwt_handler
            .encode(&claims)
            .expect("Failed to encode token")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(&self.admin)
    }

    /// Register through the public endpoint and return the created user's id
    pub async fn register(&self, email: &str, password: &str, name: &str) -> String {
        let response = self
            .post("/api/v1/auth/register")
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Post credentials to the login endpoint
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }
}
