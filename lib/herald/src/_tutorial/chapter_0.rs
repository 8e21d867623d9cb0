//! # Chapter 0: Getting Started
//!
//! Your first herald client type.
//!
//! ## What You'll Learn
//!
//! - Declare a client type with default URL and headers
//! - Declare actions returning a [`RequestSpec`](crate::RequestSpec)
//! - Build, inspect and submit a request
//!
//! ## Prerequisites
//!
//! Add to `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! herald = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Your First Client Type
//!
//! ```ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> herald::Result<()> {
//!     let articles = ClientType::builder("articles")
//!         .default_url("https://api.example.com")?
//!         .default_header("Accept", "application/json")
//!         .action("show", Method::Get, |args| {
//!             Ok(RequestSpec::new().path(format!("/articles/{}", args.get::<u64>(0)?)))
//!         })
//!         .build();
//!
//!     let request = articles.request("show", Args::new().arg(42))?;
//!     println!("{} {}", request.method(), request.url());
//!
//!     let response = request.submit().await?;
//!     println!("{:?}", response.body().as_json());
//!     Ok(())
//! }
//! ```
//!
//! ## What Happens
//!
//! ```text
//! articles.request("show", args)     SubmittableRequest   (built, not sent)
//!          .submit().await        →  pipeline + transport
//!                                    decoded Response<Body>
//! ```
//!
//! - Invoking an action never sends anything: the request can be inspected first.
//! - `submit` runs the request through a fresh middleware pipeline, decodes the
//!   body by content type and runs the after-submit callbacks.
//!
//! ## Next Steps
//!
//! - [Chapter 1: Requests & Templates][super::chapter_1] - Paths, queries, headers, bodies
