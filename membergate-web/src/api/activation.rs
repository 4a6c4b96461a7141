use chrono::Utc;
use membergate_common::MembergateError;
use membergate_core::{activate_account, delete_not_registered};
use poem::web::Data;
use poem_openapi::param::Query;
use poem_openapi::{ApiResponse, OpenApi};

pub struct Api;

#[derive(ApiResponse)]
enum ActivationResponse {
    /// The account is verified and can log in now.
    #[oai(status = 200)]
    Activated,

    /// The recipient never asked to register; the account is gone.
    #[oai(status = 202)]
    Removed,
}

#[OpenApi]
impl Api {
    /// Consumes the emailed activation link. Exactly one of the two query
    /// parameters must be present; they share the stored code but mean
    /// opposite things.
    #[oai(path = "/activation", method = "get", operation_id = "activation")]
    async fn api_activation(
        &self,
        services: Data<&membergate_core::Services>,
        #[oai(name = "activationcode")] activation_code: Query<Option<String>>,
        #[oai(name = "notregisteredcode")] not_registered_code: Query<Option<String>>,
    ) -> poem::Result<ActivationResponse> {
        let accounts = services.config.lock().await.store.accounts.clone();
        let db = services.db.lock().await;

        match (activation_code.0, not_registered_code.0) {
            (Some(code), None) => {
                activate_account(&db, &accounts, &code, Utc::now()).await?;
                Ok(ActivationResponse::Activated)
            }
            (None, Some(code)) => {
                delete_not_registered(&db, &code).await?;
                Ok(ActivationResponse::Removed)
            }
            _ => Err(MembergateError::Validation(
                "exactly one verification code parameter is required".to_owned(),
            )
            .into()),
        }
    }
}
