//! A small recipe service used by the integration tests.
//!
//! The handlers are written once against `Context` and mounted on both
//! adapters.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context as _;
use axum::body::Body;
use axum::routing::get;
use axum::Router;
use http::{Method, StatusCode};
use janus::axum::{handler, AxumContext};
use janus::core::{
    AdapterConfig, Context, Data, DataOrTemplate, NamedTemplate, NoContent, StatusError,
    TemplateRegistry, Transform, TransformError,
};
use janus::hyper::{HyperContext, Server};
use janus_test::{TestRequest, TestResponse};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u64,
    pub name: String,
    pub minutes: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewRecipe {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(max = 1440))]
    pub minutes: u32,
}

impl Transform for NewRecipe {
    fn transform(mut self) -> Result<Self, TransformError> {
        self.name = self.name.trim().to_string();
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub lang: String,
    pub results: Vec<Recipe>,
}

/// Storage the handlers depend on.
pub trait RecipeRepository: Send + Sync {
    fn create(&self, new: &NewRecipe) -> anyhow::Result<Recipe>;
    fn get(&self, id: u64) -> anyhow::Result<Recipe>;
    fn search(&self, needle: &str, limit: usize) -> anyhow::Result<Vec<Recipe>>;
    fn delete(&self, id: u64) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryRecipes {
    recipes: Mutex<BTreeMap<u64, Recipe>>,
}

impl InMemoryRecipes {
    fn with_store<T>(&self, f: impl FnOnce(&mut BTreeMap<u64, Recipe>) -> T) -> T {
        let mut store = self.recipes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }
}

impl RecipeRepository for InMemoryRecipes {
    fn create(&self, new: &NewRecipe) -> anyhow::Result<Recipe> {
        self.with_store(|store| {
            if store.values().any(|r| r.name == new.name) {
                return Err(StatusError::conflict(format!("recipe '{}' already exists", new.name)).into());
            }
            let id = store.keys().next_back().map_or(1, |last| last + 1);
            let recipe = Recipe {
                id,
                name: new.name.clone(),
                minutes: new.minutes,
            };
            store.insert(id, recipe.clone());
            Ok(recipe)
        })
    }

    fn get(&self, id: u64) -> anyhow::Result<Recipe> {
        self.with_store(|store| {
            store
                .get(&id)
                .cloned()
                .ok_or_else(|| StatusError::not_found(format!("recipe {id} not found")).into())
        })
    }

    fn search(&self, needle: &str, limit: usize) -> anyhow::Result<Vec<Recipe>> {
        let needle = needle.to_lowercase();
        Ok(self.with_store(|store| {
            store
                .values()
                .filter(|r| r.name.to_lowercase().contains(&needle))
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    fn delete(&self, id: u64) -> anyhow::Result<()> {
        self.with_store(|store| match store.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StatusError::not_found(format!("recipe {id} not found")).into()),
        })
    }
}

pub fn create<C: Context<Body = NewRecipe>>(
    repo: &dyn RecipeRepository,
    ctx: &mut C,
) -> anyhow::Result<Data<Recipe>> {
    let recipe = repo.create(ctx.body()?)?;
    ctx.set_header("x-recipe-id", &recipe.id.to_string())?;
    Ok(Data(recipe))
}

pub fn show<C: Context>(
    repo: &dyn RecipeRepository,
    ctx: &mut C,
) -> anyhow::Result<DataOrTemplate<Recipe>> {
    let id = ctx.path_param_int("id")?;
    let id = u64::try_from(id).map_err(|_| StatusError::bad_request("id must be positive"))?;
    let recipe = repo
        .get(id)
        .with_context(|| format!("loading recipe {id}"))?;
    let page = NamedTemplate::new("recipes/show", &recipe)?;
    Ok(janus::core::data_or_html(recipe, page))
}

pub fn search<C: Context>(repo: &dyn RecipeRepository, ctx: &mut C) -> anyhow::Result<Data<SearchPage>> {
    let query = ctx.query_param("q");
    let limit = ctx.query_param_int("limit", 10)?;
    let results = repo.search(&query, usize::try_from(limit).unwrap_or(0))?;
    Ok(Data(SearchPage {
        query,
        lang: ctx.main_lang().to_string(),
        results,
    }))
}

pub fn delete<C: Context>(repo: &dyn RecipeRepository, ctx: &mut C) -> anyhow::Result<NoContent> {
    ctx.cookie("admin")?;
    let id = ctx.path_param_int("id")?;
    repo.delete(u64::try_from(id).unwrap_or(0))?;
    Ok(NoContent)
}

/// Echoes the decoded name segment.
pub fn by_name<C: Context>(ctx: &mut C) -> anyhow::Result<Data<String>> {
    Ok(Data(ctx.path_param("name").to_string()))
}

/// Fails the way an unreachable backing store would.
pub fn outage<C: Context>(_ctx: &mut C) -> anyhow::Result<NoContent> {
    Err(anyhow::anyhow!("recipe store unavailable"))
}

pub fn templates() -> TemplateRegistry {
    TemplateRegistry::builder()
        .template(
            "recipes/show",
            "<article><h1>{{name}}</h1><p>{{minutes}} min</p></article>",
        )
        .unwrap()
        .build()
}

pub fn adapter_config() -> AdapterConfig {
    AdapterConfig::new().with_templates(templates())
}

pub fn hyper_app(repo: Arc<InMemoryRecipes>, config: AdapterConfig) -> Server {
    let (r1, r2, r3, r4) = (repo.clone(), repo.clone(), repo.clone(), repo);
    Server::builder()
        .adapter_config(config)
        .build()
        .route(Method::GET, "/recipes", move |ctx: &mut HyperContext| {
            search(r1.as_ref(), ctx)
        })
        .route_with_status(
            Method::POST,
            "/recipes",
            StatusCode::CREATED,
            move |ctx: &mut HyperContext<NewRecipe>| create(r2.as_ref(), ctx),
        )
        .route(Method::GET, "/recipes/{id}", move |ctx: &mut HyperContext| {
            show(r3.as_ref(), ctx)
        })
        .route(Method::DELETE, "/recipes/{id}", move |ctx: &mut HyperContext| {
            delete(r4.as_ref(), ctx)
        })
        .route(Method::GET, "/by-name/{name}", by_name::<HyperContext>)
        .route(Method::GET, "/outage", outage::<HyperContext>)
}

pub fn axum_app(repo: Arc<InMemoryRecipes>, config: AdapterConfig) -> Router {
    let config = Arc::new(config);
    let (r1, r2, r3, r4) = (repo.clone(), repo.clone(), repo.clone(), repo);
    Router::new()
        .route(
            "/recipes",
            get(handler(config.clone(), move |ctx: &mut AxumContext| {
                search(r1.as_ref(), ctx)
            }))
            .post(
                handler(config.clone(), move |ctx: &mut AxumContext<NewRecipe>| {
                    create(r2.as_ref(), ctx)
                })
                .with_default_status(StatusCode::CREATED),
            ),
        )
        .route(
            "/recipes/:id",
            get(handler(config.clone(), move |ctx: &mut AxumContext| {
                show(r3.as_ref(), ctx)
            }))
            .delete(handler(config.clone(), move |ctx: &mut AxumContext| {
                delete(r4.as_ref(), ctx)
            })),
        )
        .route("/by-name/:name", get(handler(config.clone(), by_name::<AxumContext>)))
        .route("/outage", get(handler(config, outage::<AxumContext>)))
}

/// Both adapters over separate, identically seeded stores.
pub struct Apps {
    pub hyper: Server,
    pub axum: Router,
}

impl Apps {
    pub fn new() -> Self {
        Self::with_config(adapter_config())
    }

    pub fn with_config(config: AdapterConfig) -> Self {
        Self {
            hyper: hyper_app(Arc::default(), config.clone()),
            axum: axum_app(Arc::default(), config),
        }
    }

    pub async fn hyper(&self, request: TestRequest) -> TestResponse {
        let response = self.hyper.dispatch(request.into_http_request()).await;
        TestResponse::from_http(response).await.unwrap()
    }

    pub async fn axum(&self, request: TestRequest) -> TestResponse {
        let request = request.into_http_request().map(Body::new);
        let response = self.axum.clone().oneshot(request).await.unwrap();
        TestResponse::from_http(response).await.unwrap()
    }

    /// Sends the request to both adapters and checks they answer alike.
    pub async fn both(&self, request: TestRequest) -> TestResponse {
        let from_hyper = self.hyper(request.clone()).await;
        let from_axum = self.axum(request).await;

        assert_eq!(from_hyper.status(), from_axum.status(), "status differs");
        assert_eq!(
            from_hyper.content_type(),
            from_axum.content_type(),
            "content type differs"
        );
        assert_eq!(
            comparable(&from_hyper),
            comparable(&from_axum),
            "body differs"
        );
        from_hyper
    }
}

/// The body with per-request values removed.
fn comparable(response: &TestResponse) -> String {
    let mut value: serde_json::Value = match response.content_type() {
        Some(ct) if ct.starts_with("application/json") => response.json_value().unwrap(),
        Some(ct) if ct.starts_with("application/x-yaml") => response.yaml().unwrap(),
        _ => return response.text().unwrap(),
    };
    if let Some(map) = value.as_object_mut() {
        map.remove("request_id");
    }
    value.to_string()
}
