use poem_openapi::OpenApi;

pub mod activation;
pub mod auth;
pub mod deletion;
pub mod profile;
pub mod recovery;
pub mod register;
pub mod unlock;

pub fn get() -> impl OpenApi {
    (
        auth::Api,
        register::Api,
        activation::Api,
        recovery::Api,
        deletion::Api,
        unlock::Api,
        profile::Api,
    )
}
