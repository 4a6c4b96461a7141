use membergate_common::AccountState;
use membergate_core::{find_account_by_id, update_profile};
use poem::session::Session;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use crate::common::{SessionAuthorization, SessionExt};

pub struct Api;

#[derive(Object)]
struct ProfileInfo {
    username: String,
    email: String,
    language: String,
    two_factor: Option<bool>,
    state: AccountState,
}

/// Every field is optional; absent fields stay untouched.
#[derive(Object)]
struct ProfileUpdateRequest {
    username: Option<String>,
    email: Option<String>,
    language: Option<String>,
    two_factor: Option<bool>,
}

#[derive(ApiResponse)]
enum ProfileResponse {
    #[oai(status = 200)]
    Profile(Json<ProfileInfo>),

    #[oai(status = 401)]
    Unauthorized,
}

#[OpenApi]
impl Api {
    #[oai(path = "/profile", method = "get", operation_id = "get_profile")]
    async fn api_get_profile(
        &self,
        session: &Session,
        services: Data<&membergate_core::Services>,
    ) -> poem::Result<ProfileResponse> {
        let Some(auth) = session.get_auth() else {
            return Ok(ProfileResponse::Unauthorized);
        };
        let db = services.db.lock().await;
        let Some(account) = find_account_by_id(&db, auth.account_id).await? else {
            // the account is gone, the session is stale
            session.clear();
            return Ok(ProfileResponse::Unauthorized);
        };

        Ok(ProfileResponse::Profile(Json(ProfileInfo {
            username: account.username.clone(),
            email: account.email.clone(),
            language: account.language.clone(),
            two_factor: account.two_factor,
            state: account.state(),
        })))
    }

    /// Account mutation from form input goes through the allow-listed field
    /// setters; anything outside the list fails the whole update.
    #[oai(path = "/profile", method = "put", operation_id = "update_profile")]
    async fn api_update_profile(
        &self,
        session: &Session,
        services: Data<&membergate_core::Services>,
        body: Json<ProfileUpdateRequest>,
    ) -> poem::Result<ProfileResponse> {
        let Some(auth) = session.get_auth() else {
            return Ok(ProfileResponse::Unauthorized);
        };
        let db = services.db.lock().await;
        let Some(account) = find_account_by_id(&db, auth.account_id).await? else {
            session.clear();
            return Ok(ProfileResponse::Unauthorized);
        };

        let mut fields = Vec::new();
        if let Some(username) = body.username.clone() {
            fields.push(("username".to_owned(), username));
        }
        if let Some(email) = body.email.clone() {
            fields.push(("email".to_owned(), email));
        }
        if let Some(language) = body.language.clone() {
            fields.push(("language".to_owned(), language));
        }
        if let Some(two_factor) = body.two_factor {
            fields.push(("two_factor".to_owned(), two_factor.to_string()));
        }

        let account = update_profile(&db, account, fields).await?;
        session.set_auth(SessionAuthorization {
            account_id: account.id,
            username: account.username.clone(),
        });

        Ok(ProfileResponse::Profile(Json(ProfileInfo {
            username: account.username.clone(),
            email: account.email.clone(),
            language: account.language.clone(),
            two_factor: account.two_factor,
            state: account.state(),
        })))
    }
}
