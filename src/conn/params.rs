mod connect_params;
mod connect_params_builder;
mod cp_url;
mod into_connect_params_builder;
mod mechanism;

pub use connect_params::{ConnectParams, IntoConnectParams, ServerCerts, Tls};
pub use connect_params_builder::ConnectParamsBuilder;
pub use into_connect_params_builder::IntoConnectParamsBuilder;
pub use mechanism::AuthMechanism;
