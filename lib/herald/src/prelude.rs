//! Prelude module for convenient imports.
//!
//! ```
//! use herald::prelude::*;
//! ```

pub use crate::{
    Args, Body, Callback, CallbackOptions, ClientType, EnqueueOptions, Error, ErrorKind,
    Headers, Method, Queue, Registry, Request, RequestSpec, Response, Result, RetryOn,
    StatusOptions, SubmissionJob, SubmittableRequest,
};
pub use serde::{Deserialize, Serialize};
