use membergate_common::Secret;
use membergate_core::unlock_account;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

pub struct Api;

#[derive(Object)]
struct UnlockRequest {
    code: String,
    password: String,
}

#[derive(ApiResponse)]
enum UnlockResponse {
    /// The lock is gone; a normal login works again.
    #[oai(status = 201)]
    Unlocked,
}

#[OpenApi]
impl Api {
    #[oai(path = "/unlock", method = "post", operation_id = "unlock")]
    async fn api_unlock(
        &self,
        services: Data<&membergate_core::Services>,
        body: Json<UnlockRequest>,
    ) -> poem::Result<UnlockResponse> {
        let db = services.db.lock().await;
        let body = body.0;
        unlock_account(&db, &body.code, &Secret::new(body.password)).await?;
        Ok(UnlockResponse::Unlocked)
    }
}
