use chrono::Utc;
use membergate_common::Secret;
use membergate_core::{
    confirm_deletion, ensure_delete_code_fresh, find_account_by_code, request_deletion, CodeKind,
};
use poem::session::Session;
use poem::web::Data;
use poem::Request;
use poem_openapi::param::Query;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use crate::common::SessionExt;

pub struct Api;

#[derive(Object)]
struct DeleteRequestBody {
    password: String,
}

#[derive(ApiResponse)]
enum DeleteRequestResponse {
    /// The delete link is on its way, valid for 5 minutes.
    #[oai(status = 201)]
    MailSent,

    #[oai(status = 401)]
    Unauthorized,
}

#[derive(ApiResponse)]
enum DeleteLinkResponse {
    #[oai(status = 200)]
    Ready,

    /// The visitor has to log in first; the link's query string is stashed
    /// so the post-login redirect lands back here.
    #[oai(status = 401)]
    LoginRequired,
}

#[derive(Object)]
struct DeleteConfirmBody {
    code: String,
    password: String,
    confirm: bool,
}

#[derive(ApiResponse)]
enum DeleteConfirmResponse {
    #[oai(status = 201)]
    Deleted,
}

#[OpenApi]
impl Api {
    #[oai(
        path = "/delete-request",
        method = "post",
        operation_id = "delete_request"
    )]
    async fn api_delete_request(
        &self,
        req: &Request,
        session: &Session,
        services: Data<&membergate_core::Services>,
        body: Json<DeleteRequestBody>,
    ) -> poem::Result<DeleteRequestResponse> {
        let Some(auth) = session.get_auth() else {
            return Ok(DeleteRequestResponse::Unauthorized);
        };
        let external_url = {
            let config = services.config.lock().await;
            config.construct_external_url(Some(req))?
        };
        let db = services.db.lock().await;

        request_deletion(
            &db,
            &*services.mailer,
            &external_url,
            auth.account_id,
            &Secret::new(body.0.password),
            Utc::now(),
        )
        .await?;
        Ok(DeleteRequestResponse::MailSent)
    }

    /// Consumes the emailed delete link. An unauthenticated visit routes
    /// through login first and comes back afterwards.
    #[oai(
        path = "/delete-account",
        method = "get",
        operation_id = "delete_link"
    )]
    async fn api_delete_link(
        &self,
        session: &Session,
        services: Data<&membergate_core::Services>,
        #[oai(name = "deleteaccountcode")] code: Query<String>,
    ) -> poem::Result<DeleteLinkResponse> {
        if !session.is_authenticated() {
            session.set_deletion_marker(format!("deleteaccountcode={}", code.0));
            return Ok(DeleteLinkResponse::LoginRequired);
        }

        let accounts = services.config.lock().await.store.accounts.clone();
        let db = services.db.lock().await;
        let account = find_account_by_code(&db, CodeKind::DeleteAccount, &code).await?;
        ensure_delete_code_fresh(&db, account, accounts.delete_code_ttl, Utc::now()).await?;
        Ok(DeleteLinkResponse::Ready)
    }

    #[oai(
        path = "/delete-account",
        method = "post",
        operation_id = "delete_account"
    )]
    async fn api_delete_account(
        &self,
        session: &Session,
        services: Data<&membergate_core::Services>,
        body: Json<DeleteConfirmBody>,
    ) -> poem::Result<DeleteConfirmResponse> {
        let accounts = services.config.lock().await.store.accounts.clone();
        let db = services.db.lock().await;

        let body = body.0;
        confirm_deletion(
            &db,
            &accounts,
            &*services.mailer,
            &body.code,
            &Secret::new(body.password),
            body.confirm,
            Utc::now(),
        )
        .await?;

        session.clear();
        Ok(DeleteConfirmResponse::Deleted)
    }
}
