//! # Tutorial: Declaring HTTP actions with herald
//!
//! Learn to declare client types, send their requests and defer them to a queue.
//!
//! ## Chapters
//!
//! 1. [Getting Started][chapter_0] - Your first client type
//! 2. [Requests & Templates][chapter_1] - Paths, queries, headers, bodies
//! 3. [Responses & Callbacks][chapter_2] - Decoding and after-submit hooks
//! 4. [Jobs & Middleware][chapter_3] - Queued submissions, retries, Tower layers
//!
//! Ready? Start with [Chapter 0: Getting Started][chapter_0].

pub mod chapter_0;
pub mod chapter_1;
pub mod chapter_2;
pub mod chapter_3;
