pub mod cookie;
pub mod identity;

pub use cookie::{access_token_cookie, removal_cookie, AccessToken, ACCESS_TOKEN_COOKIE};
pub use identity::{IdentityProvider, NewUser, SupabaseIdentityProvider};
