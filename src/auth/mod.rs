//! Session tokens and the request guard for protected routes

mod guard;
mod token;

pub use guard::{extract_token, CurrentUser, ACCESS_TOKEN_HEADER};
pub use token::{AuthError, Claims, IssuedToken, TokenService};
