use membergate_common::{LoginMode, MembergateError};
use membergate_db_entities::Account;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

pub async fn find_account_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<Account::Model>, MembergateError> {
    Ok(Account::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_account_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<Account::Model>, MembergateError> {
    Ok(Account::Entity::find()
        .filter(ColumnTrait::eq(&Account::Column::Email, email))
        .one(db)
        .await?)
}

/// Resolve the login identifier to an account according to the configured
/// login mode.
pub async fn find_account_by_identifier(
    db: &DatabaseConnection,
    mode: LoginMode,
    identifier: &str,
) -> Result<Option<Account::Model>, MembergateError> {
    let column = match mode {
        LoginMode::Username => Account::Column::Username,
        LoginMode::Email => Account::Column::Email,
    };
    Ok(Account::Entity::find()
        .filter(ColumnTrait::eq(&column, identifier))
        .one(db)
        .await?)
}

type FieldSetter = fn(&mut Account::ActiveModel, String);

/// The only account fields form input may write, each through a typed
/// setter. Code fields, timestamps and the password hash are deliberately
/// absent; those change through their flow transitions only.
const FORM_FIELD_SETTERS: &[(&str, FieldSetter)] = &[
    ("username", |m, v| m.username = Set(v)),
    ("email", |m, v| m.email = Set(v)),
    ("language", |m, v| m.language = Set(v)),
    ("two_factor", |m, v| m.two_factor = Set(Some(v == "true"))),
];

pub fn apply_form_field(
    model: &mut Account::ActiveModel,
    field: &str,
    value: String,
) -> Result<(), MembergateError> {
    let Some((_, setter)) = FORM_FIELD_SETTERS.iter().find(|(name, _)| *name == field) else {
        return Err(MembergateError::Validation(format!(
            "field {field} cannot be set from form input"
        )));
    };
    setter(model, value);
    Ok(())
}

/// Apply allow-listed form fields to an account and persist the result. Any
/// field outside the setter table fails the whole update.
pub async fn update_profile<I>(
    db: &DatabaseConnection,
    account: Account::Model,
    fields: I,
) -> Result<Account::Model, MembergateError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut model = account.clone().into_active_model();
    let mut touched = false;
    for (field, value) in fields {
        apply_form_field(&mut model, &field, value)?;
        touched = true;
    }
    if !touched {
        return Ok(account);
    }
    Ok(model.update(db).await?)
}

#[cfg(test)]
mod tests {
    use membergate_common::AccountState;

    use super::*;
    use crate::test_support::{active_account, insert_account, pending_account, test_db};

    #[test]
    fn listed_fields_are_settable() {
        let mut model = active_account().into_active_model();
        apply_form_field(&mut model, "language", "de".to_owned()).unwrap();
        assert_eq!(model.language.clone().unwrap(), "de");

        apply_form_field(&mut model, "two_factor", "true".to_owned()).unwrap();
        assert_eq!(model.two_factor.clone().unwrap(), Some(true));
    }

    #[test]
    fn sensitive_fields_are_rejected() {
        let mut model = active_account().into_active_model();
        for field in ["password_hash", "activation_code", "unlock_code", "created"] {
            assert!(matches!(
                apply_form_field(&mut model, field, "x".to_owned()),
                Err(MembergateError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn profile_update_persists_listed_fields() {
        let db = test_db().await;
        let account = insert_account(&db, "alice", "alice@example.org", false).await;

        let account = update_profile(
            &db,
            account,
            [
                ("language".to_owned(), "de".to_owned()),
                ("two_factor".to_owned(), "true".to_owned()),
            ],
        )
        .await
        .unwrap();
        assert_eq!(account.language, "de");
        assert_eq!(account.two_factor, Some(true));

        let stored = find_account_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(stored.language, "de");
        assert_eq!(stored.two_factor, Some(true));
    }

    #[tokio::test]
    async fn profile_update_rejects_unlisted_fields_entirely() {
        let db = test_db().await;
        let account = insert_account(&db, "alice", "alice@example.org", false).await;
        let original_hash = account.password_hash.clone();

        let result = update_profile(
            &db,
            account.clone(),
            [
                ("language".to_owned(), "de".to_owned()),
                ("password_hash".to_owned(), "$argon2id$evil".to_owned()),
            ],
        )
        .await;
        assert!(matches!(result, Err(MembergateError::Validation(_))));

        let stored = find_account_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(stored.language, account.language);
        assert_eq!(stored.password_hash, original_hash);
    }

    #[tokio::test]
    async fn empty_profile_update_is_a_no_op() {
        let db = test_db().await;
        let account = insert_account(&db, "alice", "alice@example.org", false).await;
        let unchanged = update_profile(&db, account.clone(), []).await.unwrap();
        assert_eq!(unchanged, account);
    }

    #[test]
    fn lock_takes_precedence_over_pending() {
        let mut account = pending_account();
        assert_eq!(account.state(), AccountState::Pending);

        account.unlock_code = "unl0ck".to_owned();
        assert_eq!(account.state(), AccountState::Locked);

        let mut account = active_account();
        assert_eq!(account.state(), AccountState::Active);
        account.unlock_code = "unl0ck".to_owned();
        assert_eq!(account.state(), AccountState::Locked);
    }
}
