use chrono::Utc;
use membergate_common::Secret;
use membergate_core::{register_account, RegistrationOutcome, RegistrationRequest};
use poem::web::Data;
use poem::Request;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

pub struct Api;

#[derive(Object)]
struct RegisterRequest {
    #[oai(default)]
    username: String,
    email: String,
    password: String,
    language: Option<String>,
}

#[derive(Object)]
struct RegisterState {
    mail_sent: bool,
}

#[derive(ApiResponse)]
enum RegisterResponse {
    #[oai(status = 201)]
    Created(Json<RegisterState>),

    /// The address already belongs to a pending account; the reminder went
    /// out again instead.
    #[oai(status = 200)]
    PendingDuplicate(Json<RegisterState>),
}

#[OpenApi]
impl Api {
    #[oai(path = "/register", method = "post", operation_id = "register")]
    async fn api_register(
        &self,
        req: &Request,
        services: Data<&membergate_core::Services>,
        body: Json<RegisterRequest>,
    ) -> poem::Result<RegisterResponse> {
        let (accounts, external_url) = {
            let config = services.config.lock().await;
            (
                config.store.accounts.clone(),
                config.construct_external_url(Some(req))?,
            )
        };
        let db = services.db.lock().await;

        let body = body.0;
        let outcome = register_account(
            &db,
            &accounts,
            &*services.mailer,
            &external_url,
            RegistrationRequest {
                username: body.username,
                email: body.email,
                password: Secret::new(body.password),
                language: body.language,
            },
            Utc::now(),
        )
        .await?;

        Ok(match outcome {
            RegistrationOutcome::Created { mail_sent, .. } => {
                RegisterResponse::Created(Json(RegisterState { mail_sent }))
            }
            RegistrationOutcome::PendingDuplicate { reminder_sent } => {
                RegisterResponse::PendingDuplicate(Json(RegisterState {
                    mail_sent: reminder_sent,
                }))
            }
        })
    }
}
