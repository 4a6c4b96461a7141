use chrono::Utc;
use membergate_common::Secret;
use membergate_core::{
    complete_recovery, find_account_by_code, request_recovery, CodeKind,
};
use poem::web::Data;
use poem::Request;
use poem_openapi::param::Query;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

pub struct Api;

#[derive(Object)]
struct ForgotRequest {
    email: String,
}

#[derive(ApiResponse)]
enum ForgotResponse {
    /// Deliberately identical whether the address was found or not.
    #[oai(status = 200)]
    Accepted,
}

#[derive(Object)]
struct RecoveryRequest {
    code: String,
    password: String,
    username: Option<String>,
}

#[derive(ApiResponse)]
enum RecoveryLinkResponse {
    #[oai(status = 200)]
    Valid,
}

#[derive(ApiResponse)]
enum RecoveryResponse {
    #[oai(status = 201)]
    Done,
}

#[OpenApi]
impl Api {
    #[oai(path = "/forgot", method = "post", operation_id = "forgot_login_data")]
    async fn api_forgot(
        &self,
        req: &Request,
        services: Data<&membergate_core::Services>,
        body: Json<ForgotRequest>,
    ) -> poem::Result<ForgotResponse> {
        let (accounts, external_url) = {
            let config = services.config.lock().await;
            (
                config.store.accounts.clone(),
                config.construct_external_url(Some(req))?,
            )
        };
        let db = services.db.lock().await;

        request_recovery(
            &db,
            &accounts,
            &*services.mailer,
            &external_url,
            &body.email,
            Utc::now(),
        )
        .await?;
        Ok(ForgotResponse::Accepted)
    }

    /// Consumes the emailed recovery link: checks the code is live before
    /// the new-login-data form is shown.
    #[oai(path = "/recovery", method = "get", operation_id = "recovery_link")]
    async fn api_recovery_link(
        &self,
        services: Data<&membergate_core::Services>,
        #[oai(name = "recoverylogindatacode")] code: Query<String>,
    ) -> poem::Result<RecoveryLinkResponse> {
        let db = services.db.lock().await;
        find_account_by_code(&db, CodeKind::RecoveryLoginData, &code).await?;
        Ok(RecoveryLinkResponse::Valid)
    }

    #[oai(path = "/recovery", method = "post", operation_id = "recovery")]
    async fn api_recovery(
        &self,
        services: Data<&membergate_core::Services>,
        body: Json<RecoveryRequest>,
    ) -> poem::Result<RecoveryResponse> {
        let accounts = services.config.lock().await.store.accounts.clone();
        let db = services.db.lock().await;

        let body = body.0;
        complete_recovery(
            &db,
            &accounts,
            &body.code,
            &Secret::new(body.password),
            body.username,
        )
        .await?;
        Ok(RecoveryResponse::Done)
    }
}
