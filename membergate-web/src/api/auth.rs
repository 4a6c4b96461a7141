use chrono::Utc;
use membergate_common::{MembergateError, Secret};
use membergate_core::{
    find_account_by_id, login, verify_two_factor, LoginOutcome, TwoFactorOutcome,
};
use poem::session::Session;
use poem::web::Data;
use poem::Request;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use crate::common::{SessionAuthorization, SessionExt};

pub struct Api;

#[derive(Object)]
struct LoginRequest {
    identifier: String,
    password: String,
    /// Where the user was before being sent to the login form.
    came_from: Option<String>,
}

#[derive(Object)]
struct LoginSuccess {
    redirect: String,
}

#[derive(ApiResponse)]
enum LoginResponse {
    #[oai(status = 201)]
    Success(Json<LoginSuccess>),

    /// Credentials were right, the emailed code is still owed.
    #[oai(status = 202)]
    TwoFactorRequired,

    #[oai(status = 403)]
    PendingActivation,

    #[oai(status = 423)]
    AccountLocked,

    #[oai(status = 401)]
    Failure,
}

#[derive(Object)]
struct TwoFactorRequest {
    code: String,
}

#[derive(ApiResponse)]
enum TwoFactorResponse {
    #[oai(status = 201)]
    Success(Json<LoginSuccess>),

    #[oai(status = 401)]
    WrongCode,
}

#[derive(ApiResponse)]
enum LogoutResponse {
    #[oai(status = 201)]
    Success,
}

/// Where to send the user once a login fully completes. A stashed deletion
/// marker wins so that an interposed login lands back in the deletion flow.
fn select_post_login_redirect(
    deletion_marker: Option<String>,
    configured: Option<&str>,
    came_from: Option<String>,
) -> String {
    if let Some(marker) = deletion_marker {
        return format!("/delete-account?{marker}");
    }
    if let Some(configured) = configured {
        return configured.to_owned();
    }
    came_from.unwrap_or_else(|| "/login".to_owned())
}

fn finish_login(session: &Session, configured: Option<&str>, auth: SessionAuthorization) -> String {
    session.set_auth(auth);
    select_post_login_redirect(
        session.take_deletion_marker(),
        configured,
        session.get_came_from(),
    )
}

#[OpenApi]
impl Api {
    #[oai(path = "/auth/login", method = "post", operation_id = "login")]
    async fn api_auth_login(
        &self,
        req: &Request,
        session: &Session,
        services: Data<&membergate_core::Services>,
        body: Json<LoginRequest>,
    ) -> poem::Result<LoginResponse> {
        let (accounts, external_url) = {
            let config = services.config.lock().await;
            (
                config.store.accounts.clone(),
                config.construct_external_url(Some(req))?,
            )
        };
        if let Some(came_from) = &body.came_from {
            session.set_came_from(came_from.clone());
        }
        let db = services.db.lock().await;

        let outcome = login(
            &db,
            &accounts,
            &*services.mailer,
            &services.login_guard,
            &*services.two_factor,
            &external_url,
            session.attempt_scope_id(),
            &body.identifier,
            &Secret::new(body.password.clone()),
            Utc::now(),
        )
        .await?;

        Ok(match outcome {
            LoginOutcome::Success { account } => {
                let redirect = finish_login(
                    session,
                    accounts.redirect_after_login.as_deref(),
                    SessionAuthorization {
                        account_id: account.id,
                        username: account.username,
                    },
                );
                LoginResponse::Success(Json(LoginSuccess { redirect }))
            }
            LoginOutcome::TwoFactorRequired { session: info, .. } => {
                session.set_two_factor((&info).into());
                LoginResponse::TwoFactorRequired
            }
            LoginOutcome::PendingActivation { .. } => LoginResponse::PendingActivation,
            LoginOutcome::AccountLocked { .. } => LoginResponse::AccountLocked,
            LoginOutcome::Failure { .. } => LoginResponse::Failure,
        })
    }

    #[oai(
        path = "/auth/two-factor",
        method = "post",
        operation_id = "two_factor"
    )]
    async fn api_auth_two_factor(
        &self,
        req: &Request,
        session: &Session,
        services: Data<&membergate_core::Services>,
        body: Json<TwoFactorRequest>,
    ) -> poem::Result<TwoFactorResponse> {
        let Some(handle) = session.get_two_factor() else {
            return Err(MembergateError::SessionInvalid.into());
        };
        let (accounts, external_url) = {
            let config = services.config.lock().await;
            (
                config.store.accounts.clone(),
                config.construct_external_url(Some(req))?,
            )
        };

        let mut store = services.two_factor_store.lock().await;
        let outcome = verify_two_factor(
            &mut store,
            handle.state_id,
            &handle.session_key,
            &body.code,
            session.is_authenticated(),
            accounts.two_factor_code_ttl,
        );

        match outcome {
            Err(error) => {
                drop(store);
                session.clear_two_factor();
                Err(error.into())
            }
            Ok(TwoFactorOutcome::WrongCode) => {
                let pending_account = store.get(&handle.state_id).map(|s| s.account_id);
                drop(store);

                // the miss counts against the brute-force threshold too
                if let Some(account_id) = pending_account {
                    let db = services.db.lock().await;
                    if let Some(account) = find_account_by_id(&db, account_id).await? {
                        let identifier = match accounts.login_mode {
                            membergate_common::LoginMode::Username => account.username,
                            membergate_common::LoginMode::Email => account.email,
                        };
                        services
                            .login_guard
                            .handle_failed_attempt(
                                &db,
                                &accounts,
                                &*services.mailer,
                                &external_url,
                                session.attempt_scope_id(),
                                &identifier,
                            )
                            .await?;
                    }
                }
                Ok(TwoFactorResponse::WrongCode)
            }
            Ok(TwoFactorOutcome::Authenticated(account_id)) => {
                drop(store);
                session.clear_two_factor();

                let db = services.db.lock().await;
                let Some(account) = find_account_by_id(&db, account_id).await? else {
                    return Err(MembergateError::AccountNotFound(account_id.to_string()).into());
                };
                drop(db);

                services
                    .login_guard
                    .clear_scope(session.attempt_scope_id())
                    .await;
                let redirect = finish_login(
                    session,
                    accounts.redirect_after_login.as_deref(),
                    SessionAuthorization {
                        account_id: account.id,
                        username: account.username,
                    },
                );
                Ok(TwoFactorResponse::Success(Json(LoginSuccess { redirect })))
            }
        }
    }

    #[oai(path = "/auth/logout", method = "post", operation_id = "logout")]
    async fn api_auth_logout(&self, session: &Session) -> poem::Result<LogoutResponse> {
        session.clear();
        Ok(LogoutResponse::Success)
    }
}
