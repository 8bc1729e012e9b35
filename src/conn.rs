mod authenticator;
mod directory_connection;
mod directory_link;
mod params;

pub use authenticator::DirectoryAuthenticator;
pub use directory_connection::DirectoryConnection;
pub use params::{
    AuthMechanism, ConnectParams, ConnectParamsBuilder, IntoConnectParams,
    IntoConnectParamsBuilder, ServerCerts, Tls,
};
