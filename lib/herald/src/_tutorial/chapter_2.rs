//! # Chapter 2: Responses & Callbacks
//!
//! What comes back from `submit`.
//!
//! ## Decoded Bodies
//!
//! The response `Content-Type` picks a decoder:
//!
//! | Content type                        | Body          |
//! |-------------------------------------|---------------|
//! | `application/json` (and synonyms)   | `Body::Json`  |
//! | `application/xml`, `text/xml`       | `Body::Xml`   |
//! | anything else                       | `Body::Raw`   |
//!
//! Empty bodies are never decoded. Malformed payloads fail with
//! [`Error::Parse`](crate::Error::Parse), carrying the body and the content type.
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Article { id: u64, title: String }
//!
//! let article: Article = response.body().deserialize()?;
//! ```
//!
//! Register your own decoders per content type:
//!
//! ```ignore
//! .codec("text/csv", |bytes| Ok(Body::Text(String::from_utf8_lossy(bytes).into_owned())))
//! ```
//!
//! ## After-submit Callbacks
//!
//! Callbacks run in declaration order, each one seeing the response left by the previous:
//!
//! ```ignore
//! .after_submit(Callback::body(|body| Ok(Some(body))))
//! .after_submit_with(
//!     CallbackOptions::new().only_status(400..500).only(["create"]),
//!     Callback::ambient(|ctx| {
//!         tracing::warn!(action = ctx.action(), "rejected");
//!         Ok(())
//!     }),
//! )?
//! ```
//!
//! Three shapes exist:
//!
//! - `Callback::ambient` reads and writes the response through a context
//! - `Callback::body` maps the body and must return one
//! - `Callback::triplet` maps status, headers and body and must return all three
//!
//! A callback attached to a single request runs after the client type's callbacks:
//!
//! ```ignore
//! articles
//!     .request("show", Args::new().arg(1))?
//!     .with_callback(Callback::ambient(|ctx| Ok(())))
//!     .submit()
//!     .await?;
//! ```
//!
//! ## Next Steps
//!
//! - [Chapter 3: Jobs & Middleware][super::chapter_3] - Queued submissions, retries, Tower layers
