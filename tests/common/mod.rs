use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request, StatusCode},
    Router,
};
use recipebox::{
    auth::{
        jwt::JwtKeys,
        repo_types::User,
        services::{create_superuser, create_user, UserFields},
    },
    build_app,
    recipes::repo_types::{NewRecipe, Recipe},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// Sends `body` verbatim as `application/json`, for bodies that are not valid JSON.
    pub async fn raw_request(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, json)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> User {
        create_user(
            self.state.users.as_ref(),
            email,
            password,
            UserFields::named("Tester"),
        )
        .await
        .unwrap()
    }

    pub async fn create_superuser(&self, email: &str, password: &str) -> User {
        create_superuser(self.state.users.as_ref(), email, password, "Admin")
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        JwtKeys::from_ref(&self.state).sign(user.id).unwrap()
    }

    pub async fn create_recipe(&self, user: &User, title: &str) -> Recipe {
        self.state
            .recipes
            .insert_recipe(NewRecipe {
                user_id: user.id,
                title: title.into(),
                description: "Sample Recipe Description".into(),
                time_taken: 15,
                cost: Decimal::new(525, 2),
                link: "www.samplerecipe01.com".into(),
            })
            .await
            .unwrap()
    }
}
