//! # Chapter 1: Requests & Templates
//!
//! How an action turns into a request.
//!
//! ## Path or URL
//!
//! `path` is joined onto the default URL, `url` replaces it. Passing both is an error:
//!
//! ```ignore
//! .action("feed", Method::Get, |_| Ok(RequestSpec::new().url("https://cdn.example.com/feed.xml")))
//! .action("index", Method::Get, |_| Ok(RequestSpec::new().path("/articles")))
//! ```
//!
//! An action with neither targets the default URL itself.
//!
//! ## Query Parameters
//!
//! Explicit values win over values already present in the URL:
//!
//! ```ignore
//! RequestSpec::new()
//!     .url("https://api.example.com/search?q=old&page=1")
//!     .query("q", "rust");
//! // → https://api.example.com/search?q=rust&page=1
//! ```
//!
//! Typed query structs serialize with `query_params`:
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct Search { q: String, page: u32 }
//!
//! RequestSpec::new().path("/search").query_params(&Search { q: "rust".into(), page: 2 })?;
//! ```
//!
//! ## Headers
//!
//! Headers are layered, later layers win:
//!
//! 1. `Accept` / `Content-Type` of the rendered body template
//! 2. the client type's default headers
//! 3. headers set by the action
//!
//! A request without `Accept` gets one guessed from the URL extension (`/feed.json`
//! asks for `application/json`).
//!
//! ## Body Templates
//!
//! Bodies come from templates looked up as `<template path>/<action>`. The extension of
//! the registered name gives the content type:
//!
//! ```ignore
//! let mut templates = MemoryTemplates::new();
//! templates.register("articles/create.json", |locals| {
//!     Ok(serde_json::json!({ "title": locals["arguments"][0] }).to_string())
//! });
//!
//! let articles = ClientType::builder("articles")
//!     .default_url("https://api.example.com")?
//!     .templates(templates)
//!     .action("create", Method::Post, |_| Ok(RequestSpec::new().path("/articles")))
//!     .build();
//! ```
//!
//! Templates see the action's locals plus `arguments` and `options` of the invocation.
//!
//! ## External Configuration
//!
//! Defaults can come from `<root>/clients/<name>.yml`, keyed by environment:
//!
//! ```yaml
//! development:
//!   url: http://localhost:3000
//!   headers:
//!     X-Api-Key: dev
//! ```
//!
//! ```ignore
//! let source = YamlConfig::new("config").environment("development");
//! let articles = ClientType::builder("articles").configure_from(&source)?.build();
//! ```
//!
//! ## Next Steps
//!
//! - [Chapter 2: Responses & Callbacks][super::chapter_2] - Decoding and after-submit hooks
