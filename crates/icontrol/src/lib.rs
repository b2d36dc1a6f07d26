// icontrol: Async session client for the F5 BIG-IP iControl REST API

pub mod auth;
pub mod error;
pub mod response;
pub mod session;
pub mod token;
pub mod transport;
pub mod uri;

pub use auth::{Auth, AuthStrategy, Authenticator, BasicAuth, Credentials};
pub use error::Error;
pub use response::Response;
pub use session::{BASIC_AUTH_REALM, RequestOptions, Session, SessionConfig};
pub use token::{LOGIN_PATH, TOKEN_HEADER, TokenAuth};
pub use transport::{TlsMode, TransportConfig};
pub use uri::{DEFAULT_PARTITION, Target, UriParts, build_uri};

pub use reqwest::Method;
