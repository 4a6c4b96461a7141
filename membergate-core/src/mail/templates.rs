//! Plain-text mail bodies, composed in the locale the account registered
//! under. The locale is always an explicit parameter; unknown locales fall
//! back to English.

use url::Url;

use super::Mail;

pub fn activation_mail(
    locale: &str,
    username: &str,
    activation_link: &Url,
    not_registered_link: &Url,
) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Bitte bestätigen Sie Ihr Konto".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 vielen Dank für Ihre Registrierung. Bitte bestätigen Sie Ihr Konto \
                 über den folgenden Link:\n\n{activation_link}\n\n\
                 Falls Sie sich nicht registriert haben, können Sie das Konto hier \
                 wieder entfernen lassen:\n\n{not_registered_link}\n"
            ),
        },
        _ => Mail {
            subject: "Please confirm your account".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 thank you for registering. Please confirm your account by following \
                 this link:\n\n{activation_link}\n\n\
                 If you did not register, you can have the account removed here:\n\n\
                 {not_registered_link}\n"
            ),
        },
    }
}

pub fn reminder_mail(
    locale: &str,
    username: &str,
    activation_link: &Url,
    not_registered_link: &Url,
    days_to_delete: i64,
) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Erinnerung: Ihr Konto ist noch nicht bestätigt".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 Ihr Konto wurde noch nicht bestätigt. Bitte bestätigen Sie es über \
                 den folgenden Link, sonst wird es nach {days_to_delete} Tagen \
                 gelöscht:\n\n{activation_link}\n\n\
                 Falls Sie sich nicht registriert haben, können Sie das Konto hier \
                 wieder entfernen lassen:\n\n{not_registered_link}\n"
            ),
        },
        _ => Mail {
            subject: "Reminder: your account is not confirmed yet".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 your account has not been confirmed yet. Please confirm it by \
                 following this link, otherwise it will be deleted after \
                 {days_to_delete} days:\n\n{activation_link}\n\n\
                 If you did not register, you can have the account removed here:\n\n\
                 {not_registered_link}\n"
            ),
        },
    }
}

pub fn recovery_mail(locale: &str, username: &str, link: &Url) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Zugangsdaten zurücksetzen".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 über den folgenden Link können Sie neue Zugangsdaten festlegen:\n\n\
                 {link}\n\n\
                 Falls Sie diese Nachricht nicht angefordert haben, können Sie sie \
                 ignorieren.\n"
            ),
        },
        _ => Mail {
            subject: "Reset your login data".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 you can set new login data by following this link:\n\n{link}\n\n\
                 If you did not request this message, you can ignore it.\n"
            ),
        },
    }
}

pub fn delete_request_mail(locale: &str, username: &str, link: &Url) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Löschung Ihres Kontos".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 über den folgenden Link können Sie Ihr Konto endgültig löschen. \
                 Der Link ist 5 Minuten gültig:\n\n{link}\n\n\
                 Falls Sie die Löschung nicht angefordert haben, ignorieren Sie \
                 diese Nachricht.\n"
            ),
        },
        _ => Mail {
            subject: "Deletion of your account".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 you can permanently delete your account by following this link. \
                 The link is valid for 5 minutes:\n\n{link}\n\n\
                 If you did not request the deletion, please ignore this message.\n"
            ),
        },
    }
}

pub fn deletion_confirmation_mail(locale: &str, username: &str) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Ihr Konto wurde gelöscht".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 Ihr Konto und alle zugehörigen Daten wurden endgültig gelöscht.\n"
            ),
        },
        _ => Mail {
            subject: "Your account has been deleted".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 your account and all associated data have been permanently \
                 deleted.\n"
            ),
        },
    }
}

pub fn account_locked_mail(locale: &str, username: &str, link: &Url) -> Mail {
    match locale {
        "de" => Mail {
            subject: "Ihr Konto wurde gesperrt".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 wegen verdächtiger Anmeldeversuche wurde Ihr Konto gesperrt. \
                 Über den folgenden Link können Sie es wieder entsperren:\n\n\
                 {link}\n"
            ),
        },
        _ => Mail {
            subject: "Your account has been locked".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 your account has been locked because of suspicious login \
                 attempts. You can unlock it by following this link:\n\n{link}\n"
            ),
        },
    }
}

pub fn two_factor_mail(locale: &str, username: &str, code: &str, ttl_secs: u64) -> Mail {
    let minutes = (ttl_secs / 60).max(1);
    match locale {
        "de" => Mail {
            subject: "Ihr Anmeldecode".to_owned(),
            body: format!(
                "Hallo {username},\n\n\
                 Ihr Anmeldecode lautet: {code}\n\n\
                 Der Code ist {minutes} Minuten gültig.\n"
            ),
        },
        _ => Mail {
            subject: "Your login code".to_owned(),
            body: format!(
                "Hello {username},\n\n\
                 your login code is: {code}\n\n\
                 The code is valid for {minutes} minutes.\n"
            ),
        },
    }
}
