//! Prelude module for convenient imports.
//!
//! ```ignore
//! use herald_core::prelude::*;
//! ```

pub use crate::{
    Args, Body, CodecRegistry, Error, Headers, Method, Request, Response, Result, StatusFilter,
    Templates, Transport,
};
