//! Client-side form controllers and the HTTP API they talk to.

pub mod api;
pub mod form;

pub use api::{AccountApi, ApiReply, ClientError, HttpAccountApi};
pub use form::{LoginField, LoginForm, RegisterField, RegisterForm, Session};
