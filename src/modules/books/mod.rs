pub mod models;
pub mod store;

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use shelf_http::ApiError;
use shelf_kernel::{InitCtx, Module};

use models::Book;
use store::{BookStore, SharedStore};

const BOOK_NOT_FOUND: &str = "Book not found";

/// Books module: CRUD over an in-memory, positionally identified collection.
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(BookStore::seeded())),
        }
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let seeded = self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            seeded,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route(
                "/{id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "skip",
                                "in": "query",
                                "schema": { "type": "integer", "minimum": 0, "default": 0 }
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": { "type": "integer", "minimum": 0, "default": 10 }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Ordered slice of the collection",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "The created book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by positional id",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The book at that position",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "put": {
                        "summary": "Replace the book at a position",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "The replacement book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": { "description": "Book not found" },
                            "422": { "description": "Validation error" },
                            "500": { "description": "Unexpected failure during replacement" }
                        }
                    },
                    "delete": {
                        "summary": "Remove the book at a position",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The removed book; later positions shift down",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": { "description": "Book not found" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "description": "Title of the book"
                            },
                            "author": {
                                "type": "string",
                                "description": "Author of the book"
                            },
                            "publication_year": {
                                "type": "integer",
                                "description": "Year the book was published"
                            }
                        },
                        "required": ["title", "author", "publication_year"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "ListQuery::default_limit")]
    limit: usize,
}

impl ListQuery {
    fn default_limit() -> usize {
        10
    }
}

/// List the slice `[skip, skip + limit)` of the collection. Never fails.
async fn list_books(
    State(store): State<SharedStore>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Book>> {
    let store = store.read().unwrap_or_else(PoisonError::into_inner);
    Json(store.list(query.skip, query.limit))
}

/// Get the book at position `id`.
async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let store = store.read().unwrap_or_else(PoisonError::into_inner);
    let index = checked_index(id, store.len())?;

    store
        .get(index)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))
}

/// Append a validated book; its identifier is the prior store length.
async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = Book::from_payload(&json_body(payload)?)?;

    let mut store = store.write().unwrap_or_else(PoisonError::into_inner);
    let index = store.append(book.clone());
    tracing::debug!(index, "book created");

    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace the book at position `id` in place.
///
/// The body is validated before the bounds check, matching the order in
/// which the inputs are resolved. A failure in the replace step itself has
/// no known trigger but is wrapped as an internal error for compatibility.
async fn update_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let book = Book::from_payload(&json_body(payload)?)?;

    let mut store = store.write().unwrap_or_else(PoisonError::into_inner);
    let index = checked_index(id, store.len())?;
    let replaced = store.replace(index, book)?;

    Ok(Json(replaced))
}

/// Remove the book at position `id`; later books shift down by one.
async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let mut store = store.write().unwrap_or_else(PoisonError::into_inner);
    let index = checked_index(id, store.len())?;

    store
        .remove(index)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))
}

/// Bounds-check a signed positional id against the store length observed at
/// request time.
fn checked_index(id: i64, len: usize) -> Result<usize, ApiError> {
    usize::try_from(id)
        .ok()
        .filter(|&index| index < len)
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))
}

/// Unwrap a JSON body, mapping extractor rejections (malformed JSON,
/// wrong content type) into the validation detail format.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::validation(vec![ApiError::field_detail(
            &["body"],
            &rejection.body_text(),
            "json_invalid",
        )])),
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().nest("/api/v1/books", BooksModule::new().routes())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn list_defaults_and_slicing() {
        let app = app();

        let (status, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);

        let (status, body) = send(&app, get_request("/api/v1/books/?skip=1&limit=3")).await;
        assert_eq!(status, StatusCode::OK);
        let page = body.as_array().unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0]["title"], "1984");

        let (status, body) = send(&app, get_request("/api/v1/books/?skip=15")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, get_request("/api/v1/books/?skip=5&limit=10")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn get_returns_seed_entity_at_position() {
        let (status, body) = send(&app(), get_request("/api/v1/books/4")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "title": "Harry Potter y la piedra filosofal",
                "author": "J.K. Rowling",
                "publication_year": 1997
            })
        );
    }

    #[tokio::test]
    async fn get_out_of_range_is_404() {
        let app = app();

        let (status, body) = send(&app, get_request("/api/v1/books/-1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Book not found" }));

        let (status, body) = send(&app, get_request("/api/v1/books/5")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Book not found" }));
    }

    #[tokio::test]
    async fn create_appends_and_round_trips() {
        let app = app();
        let payload = json!({"title": "T", "author": "A", "publication_year": 2000});

        let (status, body) =
            send(&app, json_request(Method::POST, "/api/v1/books/", &payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, payload);

        // New identifier is the prior store length.
        let (status, body) = send(&app, get_request("/api/v1/books/5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, payload);

        let (_, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(body.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn create_with_missing_field_is_422() {
        let payload = json!({"title": "T", "publication_year": 2000});

        let (status, body) =
            send(&app(), json_request(Method::POST, "/api/v1/books/", &payload)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["body", "author"]));
        assert_eq!(body["detail"][0]["type"], "missing");
    }

    #[tokio::test]
    async fn create_with_numeric_string_year_is_422() {
        let payload = json!({"title": "T", "author": "A", "publication_year": "1999"});

        let (status, body) =
            send(&app(), json_request(Method::POST, "/api/v1/books/", &payload)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["type"], "int_type");
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let app = app();
        let payload = json!({"title": "New Title", "author": "New Author", "publication_year": 2022});

        let (status, body) =
            send(&app, json_request(Method::PUT, "/api/v1/books/0", &payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, payload);

        let (_, body) = send(&app, get_request("/api/v1/books/0")).await;
        assert_eq!(body, payload);

        // Length is unchanged.
        let (_, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn update_out_of_range_is_404_and_leaves_store_unchanged() {
        let app = app();
        let payload = json!({"title": "New Title", "author": "New Author", "publication_year": 2022});

        for uri in ["/api/v1/books/100", "/api/v1/books/-1"] {
            let (status, body) = send(&app, json_request(Method::PUT, uri, &payload)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "detail": "Book not found" }));
        }

        let (_, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn update_with_invalid_body_is_422_even_for_bad_id() {
        let payload = json!({"author": "New Author", "publication_year": 2022});

        // Body validation resolves before the bounds check.
        let (status, body) =
            send(&app(), json_request(Method::PUT, "/api/v1/books/100", &payload)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["body", "title"]));
    }

    #[tokio::test]
    async fn delete_shifts_later_identifiers() {
        let app = app();

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/v1/books/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "1984");

        // What was at position 2 is now at position 1.
        let (status, body) = send(&app, get_request("/api/v1/books/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Cien años de soledad");

        let (_, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn delete_out_of_range_is_404() {
        let app = app();

        for uri in ["/api/v1/books/20", "/api/v1/books/-1"] {
            let (status, body) = send(
                &app,
                Request::builder()
                    .method(Method::DELETE)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "detail": "Book not found" }));
        }

        let (_, body) = send(&app, get_request("/api/v1/books/")).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }
}
